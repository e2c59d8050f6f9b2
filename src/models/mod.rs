pub mod candidate;
pub mod feedback;
pub mod history;
pub mod interview;
pub mod interviewer;
pub mod screening;
