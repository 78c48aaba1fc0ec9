//! Progress tracing, following the teacher crate's `progress::Tracer`
//! convention: every protocol entry point takes an `Option<&mut dyn Tracer>`
//! and brackets each phase with calls into it. This is how the core exposes
//! hooks a benchmark harness (explicitly out of scope, spec §1) would
//! attach to, without the core depending on `log`/`tracing` itself.

/// Receives notifications as a protocol instance progresses.
pub trait Tracer {
    fn protocol_begins(&mut self) {}
    fn protocol_ends(&mut self) {}
    fn round_begins(&mut self) {}
    fn stage(&mut self, _name: &'static str) {}
    fn send_msg(&mut self) {}
    fn msg_sent(&mut self) {}
    fn receive_msgs(&mut self) {}
    fn msgs_received(&mut self) {}
}

/// Blanket impl so call sites can write `tracer.stage("...")` uniformly
/// whether or not a tracer was supplied, instead of matching on `Option`
/// at every call site.
impl Tracer for Option<&mut dyn Tracer> {
    fn protocol_begins(&mut self) {
        if let Some(t) = self {
            t.protocol_begins()
        }
    }
    fn protocol_ends(&mut self) {
        if let Some(t) = self {
            t.protocol_ends()
        }
    }
    fn round_begins(&mut self) {
        if let Some(t) = self {
            t.round_begins()
        }
    }
    fn stage(&mut self, name: &'static str) {
        if let Some(t) = self {
            t.stage(name)
        }
    }
    fn send_msg(&mut self) {
        if let Some(t) = self {
            t.send_msg()
        }
    }
    fn msg_sent(&mut self) {
        if let Some(t) = self {
            t.msg_sent()
        }
    }
    fn receive_msgs(&mut self) {
        if let Some(t) = self {
            t.receive_msgs()
        }
    }
    fn msgs_received(&mut self) {
        if let Some(t) = self {
            t.msgs_received()
        }
    }
}

/// A tracer that records wall-clock duration spent in each named stage,
/// suitable as the attachment point for an external benchmark harness.
#[derive(Default)]
pub struct PerfProfiler {
    current_stage: Option<&'static str>,
    stage_started: Option<std::time::Instant>,
    pub stage_durations: Vec<(&'static str, std::time::Duration)>,
}

impl PerfProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    fn close_current_stage(&mut self) {
        if let (Some(name), Some(started)) = (self.current_stage.take(), self.stage_started.take())
        {
            self.stage_durations.push((name, started.elapsed()));
        }
    }
}

impl Tracer for PerfProfiler {
    fn stage(&mut self, name: &'static str) {
        self.close_current_stage();
        self.current_stage = Some(name);
        self.stage_started = Some(std::time::Instant::now());
    }

    fn protocol_ends(&mut self) {
        self.close_current_stage();
    }
}
