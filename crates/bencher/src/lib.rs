//! Raw requests the benchmarks feed to the decoder and the connection loop.

pub static GET_SMALL: TestFile = TestFile::new("get_small.txt", include_bytes!("../resources/request/get_small.txt"));
pub static GET_LARGE: TestFile = TestFile::new("get_large.txt", include_bytes!("../resources/request/get_large.txt"));
pub static POST_LENGTH: TestFile = TestFile::new("post_length.txt", include_bytes!("../resources/request/post_length.txt"));
pub static POST_CHUNKED: TestFile = TestFile::new("post_chunked.txt", include_bytes!("../resources/request/post_chunked.txt"));

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
}

impl TestCase {
    pub const fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    /// The request repeated `times` times back to back, as a client
    /// pipelining on one connection would send it.
    pub fn pipelined(&self, times: usize) -> Vec<u8> {
        self.file.content.repeat(times)
    }
}

/// One complete request, head and body.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static [u8],
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static [u8]) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

pub fn request_cases() -> Vec<TestCase> {
    vec![
        TestCase::new("get_small", GET_SMALL),
        TestCase::new("get_large", GET_LARGE),
        TestCase::new("post_length", POST_LENGTH),
        TestCase::new("post_chunked", POST_CHUNKED),
    ]
}
