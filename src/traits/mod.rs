pub mod filesystem;
pub mod http;
pub mod output;
pub mod user_input;

pub use filesystem::{FileSystem, RealFileSystem};
pub use http::{HttpReply, HttpRequest, HttpTransport, ReqwestTransport, TransportFailure};
pub use output::{Output, TerminalOutput};
pub use user_input::{InquireUserInput, UserInput};

#[cfg(test)]
pub use filesystem::MockFileSystem;
#[cfg(test)]
pub use http::MockTransport;
#[cfg(test)]
pub use output::{MockOutput, OutputMessage};
#[cfg(test)]
pub use user_input::{MockResponse, MockUserInput};
