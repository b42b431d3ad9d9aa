//! List the expression keywords the registry understands.

use std::io::{self, Write};

use anyhow::Result;
use spigot_core::SourceRegistry;

pub fn execute() -> Result<()> {
    write_listing(&mut io::stdout().lock(), &SourceRegistry::standard())
}

fn write_listing(out: &mut impl Write, registry: &SourceRegistry) -> Result<()> {
    let width = registry
        .entries()
        .iter()
        .map(|e| e.usage.len())
        .max()
        .unwrap_or(0);

    writeln!(out, "Sources and operators")?;
    writeln!(out, "{:-<60}", "")?;
    for entry in registry.entries() {
        writeln!(out, "  {:<width$}  {}", entry.usage, entry.summary, width = width)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Any other numeric literal (42, -7/2, 1.25e-3, 0x1.8p1) is an exact rational."
    )?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_aligns_usage_column() {
        let mut out = Vec::new();
        write_listing(&mut out, &SourceRegistry::standard()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Sources and operators\n"));
        let pi = text.lines().find(|l| l.trim_start().starts_with("pi ")).unwrap();
        let log = text.lines().find(|l| l.trim_start().starts_with("logbase")).unwrap();
        assert_eq!(
            pi.find("the circle constant"),
            log.find("logarithm of x to base b")
        );
    }

    #[test]
    fn test_listing_reports_closed_output() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_listing(&mut Closed, &SourceRegistry::standard()).unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }
}
