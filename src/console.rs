use std::fmt::Display;
use std::io::{self, Stdout, Write};

use crate::measurement::HeartRateSample;

/// Line-oriented output sink.
///
/// Samples are written as bare integers, one per line. Everything else is a
/// status line of free text, so a consumer can separate the two by checking
/// whether a line parses as a number.
pub struct Console<W> {
    out: W,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn status(&mut self, line: impl Display) -> io::Result<()> {
        self.line(line)
    }

    pub fn sample(&mut self, sample: HeartRateSample) -> io::Result<()> {
        self.line(sample.bpm())
    }

    fn line(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
