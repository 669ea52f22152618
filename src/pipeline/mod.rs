//! Request preprocessing and the response rewrite pass

pub mod mutate;
pub mod request;
pub mod response;

pub use mutate::HeaderIndex;
pub use request::{preprocess, strip_sync};
pub use response::{KindSwitches, Outcome, ResponsePipeline, UNEXPECTED_SCRIPT};
