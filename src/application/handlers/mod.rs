pub mod batch;
pub mod dispatcher;
pub mod queue;
