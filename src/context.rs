use crate::traits::{
    FileSystem, HttpTransport, InquireUserInput, Output, RealFileSystem, TerminalOutput, UserInput,
};
#[cfg(test)]
use crate::traits::{MockFileSystem, MockOutput, MockTransport, MockUserInput};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
#[derive(Clone)]
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub input: Arc<dyn UserInput>,
    pub output: Arc<dyn Output>,
    pub transport: Arc<dyn HttpTransport>,
}

impl Context {
    /// Create a context with real implementations around the given transport
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            input: Arc::new(InquireUserInput),
            output: Arc::new(TerminalOutput),
            transport,
        }
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            fs: Arc::new(MockFileSystem::new()),
            input: Arc::new(MockUserInput::new()),
            output: Arc::new(MockOutput::new()),
            transport: Arc::new(MockTransport::new()),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        input: Arc<dyn UserInput>,
        output: Arc<dyn Output>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            fs,
            input,
            output,
            transport,
        }
    }
}
