// Mock interviews: feedback from the text-generation collaborator, score
// extraction, and the submission/history endpoints.

pub mod feedback;
pub mod handlers;
pub mod prompts;
