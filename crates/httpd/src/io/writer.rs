use crate::io::Output;
use std::io;

/// A push-style body producer.
///
/// Where a streamed body is easier to express as "write everything into this
/// sink" than as a pull loop, a [`Writer`] receives the outgoing [`Output`]
/// and writes the whole body in one go. The connection wraps the sink in
/// chunked framing before handing it over.
pub trait Writer: Send {
    fn write_to(self: Box<Self>, output: &mut dyn Output) -> io::Result<()>;
}

impl<F> Writer for F
where
    F: FnOnce(&mut dyn Output) -> io::Result<()> + Send,
{
    fn write_to(self: Box<Self>, output: &mut dyn Output) -> io::Result<()> {
        (*self)(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferOutput;

    #[test]
    fn closure_writer() {
        let writer: Box<dyn Writer> = Box::new(|out: &mut dyn Output| {
            out.output(b"line 1\n")?;
            out.output(b"line 2\n")
        });

        let mut sink = BufferOutput::new();
        writer.write_to(&mut sink).unwrap();
        assert_eq!(sink.as_slice(), b"line 1\nline 2\n");
    }
}
