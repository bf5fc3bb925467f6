use std::time::Duration;

/// Default capacity of the read buffer, enough for a typical response head.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Transport settings of a [`SimpleClientHttpRequestFactory`](super::SimpleClientHttpRequestFactory).
///
/// Timeouts are off unless set. The read timeout bounds each wait for the
/// response head, reading the body is not limited.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    read_buffer_size: usize,
    user_agent: Option<String>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::new().build()
    }
}

#[derive(Debug)]
pub struct ClientConfigBuilder {
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    read_buffer_size: usize,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    fn new() -> Self {
        Self { connect_timeout: None, read_timeout: None, read_buffer_size: DEFAULT_READ_BUFFER_SIZE, user_agent: None }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// A zero size falls back to the default.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = if size == 0 { DEFAULT_READ_BUFFER_SIZE } else { size };
        self
    }

    /// Sent as `User-Agent` on requests that don't set one.
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            read_buffer_size: self.read_buffer_size,
            user_agent: self.user_agent,
        }
    }
}
