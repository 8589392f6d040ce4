// Submission pipeline: validation and the accept-then-classify flow.

pub mod submission;
pub mod validation;
