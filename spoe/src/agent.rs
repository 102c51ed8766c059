use std::time::Duration;

use haproxy_spop::{Capability, Version};

/// Static configuration for a SPOE agent: the backend it talks to, the
/// capabilities HAProxy will offer it, and the limits that bound how hard
/// the engine will push frames at it.
#[derive(Clone, Debug)]
pub struct Agent {
    pub name: String,
    pub supported_versions: Vec<Version>,
    pub capabilities: Vec<Capability>,
    pub max_frame_size: u32,
    pub timeout_hello: Duration,
    pub timeout_idle: Duration,
    pub timeout_processing: Duration,
    pub min_applets: usize,
    pub max_applets: usize,
    pub frames_per_activation: usize,
    pub max_connections_per_sec: Option<u32>,
    pub max_errors_per_sec: Option<u32>,
    pub continue_on_error: bool,
    pub var_on_error: Option<String>,
    pub engine_id: String,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder::new(name)
    }
}

/// Builds an [`Agent`] configuration, field by field, the way the rest of
/// this stack builds its runtime/connection config objects.
#[derive(Debug)]
pub struct Builder {
    name: String,
    supported_versions: Vec<Version>,
    capabilities: Vec<Capability>,
    max_frame_size: u32,
    timeout_hello: Duration,
    timeout_idle: Duration,
    timeout_processing: Duration,
    min_applets: usize,
    max_applets: usize,
    frames_per_activation: usize,
    max_connections_per_sec: Option<u32>,
    max_errors_per_sec: Option<u32>,
    continue_on_error: bool,
    var_on_error: Option<String>,
    engine_id: Option<String>,
}

impl Builder {
    pub fn new(name: impl Into<String>) -> Self {
        Builder {
            name: name.into(),
            supported_versions: vec![Version::V2_0],
            capabilities: Vec::new(),
            max_frame_size: haproxy_spop::MAX_FRAME_SIZE as u32,
            timeout_hello: Duration::from_secs(5),
            timeout_idle: Duration::from_secs(120),
            timeout_processing: Duration::from_secs(15),
            min_applets: 1,
            max_applets: 100,
            frames_per_activation: 10,
            max_connections_per_sec: None,
            max_errors_per_sec: None,
            continue_on_error: false,
            var_on_error: None,
            engine_id: None,
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.supported_versions.push(version);
        self
    }

    pub fn pipelining(mut self) -> Self {
        self.capabilities.push(Capability::Pipelining);
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.capabilities.push(Capability::Async);
        self
    }

    pub fn fragmentation(mut self) -> Self {
        self.capabilities.push(Capability::Fragmentation);
        self
    }

    pub fn max_frame_size(mut self, sz: u32) -> Self {
        self.max_frame_size = sz;
        self
    }

    pub fn timeout_hello(mut self, d: Duration) -> Self {
        self.timeout_hello = d;
        self
    }

    pub fn timeout_idle(mut self, d: Duration) -> Self {
        self.timeout_idle = d;
        self
    }

    pub fn timeout_processing(mut self, d: Duration) -> Self {
        self.timeout_processing = d;
        self
    }

    pub fn min_applets(mut self, n: usize) -> Self {
        self.min_applets = n;
        self
    }

    pub fn max_applets(mut self, n: usize) -> Self {
        self.max_applets = n;
        self
    }

    pub fn frames_per_activation(mut self, n: usize) -> Self {
        self.frames_per_activation = n;
        self
    }

    pub fn max_connections_per_sec(mut self, n: u32) -> Self {
        self.max_connections_per_sec = Some(n);
        self
    }

    pub fn max_errors_per_sec(mut self, n: u32) -> Self {
        self.max_errors_per_sec = Some(n);
        self
    }

    pub fn continue_on_error(mut self, enable: bool) -> Self {
        self.continue_on_error = enable;
        self
    }

    pub fn var_on_error(mut self, var: impl Into<String>) -> Self {
        self.var_on_error = Some(var.into());
        self
    }

    pub fn engine_id(mut self, id: impl Into<String>) -> Self {
        self.engine_id = Some(id.into());
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            engine_id: self.engine_id.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            supported_versions: self.supported_versions,
            capabilities: self.capabilities,
            max_frame_size: self.max_frame_size,
            timeout_hello: self.timeout_hello,
            timeout_idle: self.timeout_idle,
            timeout_processing: self.timeout_processing,
            min_applets: self.min_applets,
            max_applets: self.max_applets,
            frames_per_activation: self.frames_per_activation,
            max_connections_per_sec: self.max_connections_per_sec,
            max_errors_per_sec: self.max_errors_per_sec,
            continue_on_error: self.continue_on_error,
            var_on_error: self.var_on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_engine_id_to_name() {
        let agent = Agent::builder("ips").build();

        assert_eq!(agent.name, "ips");
        assert_eq!(agent.engine_id, "ips");
        assert_eq!(agent.min_applets, 1);
    }

    #[test]
    fn builder_collects_capabilities() {
        let agent = Agent::builder("ips").pipelining().fragmentation().build();

        assert!(agent.capabilities.contains(&Capability::Pipelining));
        assert!(agent.capabilities.contains(&Capability::Fragmentation));
        assert!(!agent.capabilities.contains(&Capability::Async));
    }
}
