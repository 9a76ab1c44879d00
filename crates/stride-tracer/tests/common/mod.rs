use std::sync::Arc;

use stride_probe::Probe;
use stride_tracer::binding::{Frame, Value};
use stride_tracer::event::{Receiver, TypeDescriptor};
use stride_tracer::tracer::Tracer;

/// Small instrumented program.
pub struct Program {
    pub probe: Probe,
    pub math: Arc<TypeDescriptor>,
    pub planet: Arc<TypeDescriptor>,
    pub integer: Arc<TypeDescriptor>,
}

impl Program {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            probe: Probe::new(),
            math: Arc::new(TypeDescriptor::new("Math").type_method("add")),
            planet: Arc::new(TypeDescriptor::new("Planet").instance_method("echo")),
            integer: Arc::new(TypeDescriptor::new("Integer").instance_method("to_s")),
        })
    }

    /// `Math.add`: computes `sum = x + y`, then returns `sum.to_s`.
    ///
    /// The arguments are read back from the frame after the call is
    /// reported, so that a paused caller can change them.
    pub fn add(&self, x: i64, y: i64) -> String {
        let frame = Frame::new().with("x", x).with("y", y);
        let _call = self.probe.enter(&Receiver::of_type(&self.math), "add", &frame);

        let x = frame.get("x").and_then(|x| x.as_int()).unwrap();
        let y = frame.get("y").and_then(|y| y.as_int()).unwrap();

        let sum = x + y;
        frame.set("sum", sum);

        let integer = Receiver::instance(&self.integer, sum as u64);
        self.probe.native_call(&integer, "to_s", &frame);
        let text = sum.to_string();
        self.probe.native_return(&integer, "to_s", &frame);

        frame.set("text", text.as_str());
        text
    }

    /// `Planet#echo`: returns its message.
    pub fn echo(&self, planet: u64, message: &str) -> String {
        let frame = Frame::new().with("message", message);
        let receiver = Receiver::instance(&self.planet, planet);

        let _call = self.probe.enter(&receiver, "echo", &frame);
        self.probe.line(&receiver, &frame);

        match frame.get("message") {
            Some(Value::Str(message)) => message,
            _ => String::new(),
        }
    }
}

/// Reports a line when dropped, unwinding or not.
pub struct LineOnDrop<'a>(pub &'a Program);

impl Drop for LineOnDrop<'_> {
    fn drop(&mut self) {
        self.0.probe.line(&Receiver::None, &Frame::new());
    }
}

/// Builds a tracer running `body` against `program`.
pub fn tracer<F>(program: &Arc<Program>, body: F) -> Tracer<Probe>
where
    F: Fn(&Program) + Send + Sync + 'static,
{
    let traced = Arc::clone(program);

    Tracer::builder()
        .with_source(program.probe.clone())
        .with_target(move || body(&traced))
        .build()
}
