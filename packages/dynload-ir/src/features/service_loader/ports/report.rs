//! Report sinks for diagnostics and resolved calls
//!
//! The resolver only produces `Diagnostic`s; how they are presented is up
//! to the sink. `TextReport` writes the plain-text failed-propagation
//! report, `MemoryReport` keeps them for inspection.

use chrono::{DateTime, Local};
use std::io::{self, Write};

use crate::features::service_loader::domain::{ClassAnalysis, Diagnostic};

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Receives diagnostics in discovery order
pub trait ReportSink: Send {
    fn report(&mut self, diagnostic: &Diagnostic);

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Failed-propagation report as text
pub struct TextReport<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> TextReport<W> {
    /// Start a report stamped with the current local time
    pub fn new(writer: W) -> io::Result<Self> {
        Self::with_timestamp(writer, Local::now())
    }

    pub fn with_timestamp(mut writer: W, generated_on: DateTime<Local>) -> io::Result<Self> {
        writeln!(
            writer,
            "------------ Failed Propagation Information Report generated On {} ------------",
            generated_on.format(DATE_FORMAT)
        )?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_entry(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        writeln!(self.writer, "ClassName: {} ", diagnostic.class())?;
        if let Diagnostic::SolverUnavailable { .. } = diagnostic {
            write!(self.writer, "\t\t Solver was null")?;
        }
        writeln!(self.writer, "\t\t{}", diagnostic.call())
    }
}

impl<W: Write + Send> ReportSink for TextReport<W> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        if let Err(e) = self.write_entry(diagnostic) {
            tracing::warn!(class = %diagnostic.class(), error = %e, "failed to write report entry");
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps diagnostics in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryReport {
    diagnostics: Vec<Diagnostic>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl ReportSink for MemoryReport {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Resolved-call report: class, enclosing method, entry method, call
///
/// Classes without resolved calls are left out.
pub fn write_resolved_report<'a, W, I>(writer: &mut W, analyses: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ClassAnalysis>,
{
    writeln!(writer, "PROP REPORT ")?;
    for analysis in analyses {
        if analysis.is_empty() {
            continue;
        }
        writeln!(writer, "{} ", analysis.class)?;
        for resolution in &analysis.resolutions {
            writeln!(writer, "\t {}", resolution.method)?;
            for entry in &resolution.calls {
                writeln!(writer, "\t\t {}", entry.entry)?;
                writeln!(writer, "\t\t\t {} ", entry.call)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::service_loader::domain::{DynamicLoadCall, EntryMethodWithCall};
    use crate::shared::constants::jvm;
    use crate::shared::models::{
        ClassType, Constant, Immediate, InvokeExpr, Local, MethodSignature, StmtId, Type,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn run() -> MethodSignature {
        MethodSignature::new("a.A", "run", vec![], Type::Void)
    }

    fn load(arg: Immediate) -> DynamicLoadCall {
        let sig = MethodSignature::new(
            jvm::JAVA_UTIL_SERVICE_LOADER,
            jvm::LOAD,
            vec![Type::class()],
            Type::object(jvm::JAVA_UTIL_SERVICE_LOADER),
        );
        DynamicLoadCall::new(StmtId::new(run(), 2), InvokeExpr::new_static(sig, vec![arg]))
    }

    fn report_text(diagnostics: &[Diagnostic]) -> String {
        let stamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let mut report = TextReport::with_timestamp(Vec::new(), stamp).unwrap();
        for d in diagnostics {
            report.report(d);
        }
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_text_report_layout() {
        let call = load(Immediate::Local(Local::new("c", Type::class())));
        let text = report_text(&[
            Diagnostic::Unresolved {
                class: ClassType::new("a.A"),
                call: call.clone(),
            },
            Diagnostic::SolverUnavailable {
                class: ClassType::new("a.A"),
                call: call.clone(),
                reason: "superclass x.Base is outside the view".to_string(),
            },
        ]);
        let expected = format!(
            "------------ Failed Propagation Information Report generated On 09/03/2024 14:05:07 ------------\n\
             ClassName: a.A \n\t\t{call}\n\
             ClassName: a.A \n\t\t Solver was null\t\t{call}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_memory_report_keeps_order() {
        let mut sink = MemoryReport::new();
        for name in ["a.A", "a.B"] {
            sink.report(&Diagnostic::Unresolved {
                class: ClassType::new(name),
                call: load(Immediate::Local(Local::new("c", Type::class()))),
            });
        }
        let classes: Vec<_> = sink
            .diagnostics()
            .iter()
            .map(|d| d.class().name().to_string())
            .collect();
        assert_eq!(classes, vec!["a.A", "a.B"]);
    }

    #[test]
    fn test_resolved_report_skips_empty_classes() {
        let call = load(Immediate::Constant(Constant::class("a/Svc")));
        let mut resolved = ClassAnalysis::new(ClassType::new("a.A"));
        resolved.record(&run(), EntryMethodWithCall::new(run(), call.clone()));
        let empty = ClassAnalysis::new(ClassType::new("a.Empty"));

        let mut out = Vec::new();
        write_resolved_report(&mut out, [&resolved, &empty]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!("PROP REPORT \na.A \n\t {m}\n\t\t {m}\n\t\t\t {call} \n", m = run())
        );
    }
}
