// Roadmaps and their daily tasks: plain creation, listing and task completion.
// Scoring and streak effects are applied by `ProgressService`.

pub mod handlers;
