/// A recorded response and the method of the request it answers.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    head_request: bool,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, head_request: false, file }
    }

    /// The same response, read as the answer to a `HEAD` request.
    pub fn head(name: &'static str, file: TestFile) -> Self {
        Self { name, head_request: true, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_head_request(&self) -> bool {
        self.head_request
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}
