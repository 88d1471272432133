//! PDF conversion and report typesetting through external programs.

use crate::error::{Result, VisError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const INKSCAPE_ENV_BIN: &str = "VISCAD_INKSCAPE";
const DEFAULT_INKSCAPE_BIN: &str = "inkscape";
const PDFLATEX_ENV_BIN: &str = "VISCAD_PDFLATEX";
const DEFAULT_PDFLATEX_BIN: &str = "pdflatex";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Height in points of one report page of ten constructs.
const REPORT_PAGE_HEIGHT: i64 = 1500;
const CONSTRUCTS_PER_PAGE: i64 = 10;

pub const DEFAULT_REPORT_TEMPLATE: &str = include_str!("../assets/report_template.tex");

pub fn resolve_tool_executable(env_var: &str, default_bin: &str) -> String {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_bin.to_string())
}

#[derive(Debug)]
enum ToolFailure {
    /// Worth one more attempt: the tool hung or could not be started.
    Transient(String),
    Fatal(String),
}

#[derive(Clone, Debug)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: vec![],
            current_dir: None,
            timeout,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Runs the tool to completion, retrying once after a transient failure.
    pub fn run(&self) -> Result<()> {
        let outcome = match self.run_once() {
            Err(ToolFailure::Transient(reason)) => {
                tracing::warn!(program = %self.program, %reason, "retrying external tool");
                self.run_once()
            }
            other => other,
        };
        outcome.map_err(|failure| {
            let reason = match failure {
                ToolFailure::Transient(reason) | ToolFailure::Fatal(reason) => reason,
            };
            VisError::ExternalTool {
                program: self.program.clone(),
                reason,
            }
        })
    }

    fn run_once(&self) -> std::result::Result<(), ToolFailure> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ToolFailure::Fatal(format!("executable not found: {e}"))
            } else {
                ToolFailure::Transient(format!("could not start: {e}"))
            }
        })?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => return Err(ToolFailure::Fatal(format!("exited with {status}"))),
                Ok(None) => {}
                Err(e) => return Err(ToolFailure::Transient(format!("could not wait: {e}"))),
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolFailure::Transient(format!(
                    "timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

pub fn convert_svg_to_pdf(svg: &Path, pdf: &Path, timeout: Duration) -> Result<()> {
    let inkscape = resolve_tool_executable(INKSCAPE_ENV_BIN, DEFAULT_INKSCAPE_BIN);
    ToolCommand::new(&inkscape, timeout)
        .arg(svg.to_string_lossy())
        .arg("-A")
        .arg(pdf.to_string_lossy())
        .run()
}

/// `drawing.pdf` -> `drawing_report.tex`
pub fn report_tex_path(pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    pdf.with_file_name(format!("{stem}_report.tex"))
}

/// One `\includegraphics` per page of ten constructs, each trimming the
/// drawing down to its own ten rows.
pub fn report_page_includes(pdf_name: &str, size: usize) -> Vec<String> {
    let size = size as i64;
    let pages = size / CONSTRUCTS_PER_PAGE;
    let short = (CONSTRUCTS_PER_PAGE - size).rem_euclid(CONSTRUCTS_PER_PAGE);
    (0..pages)
        .map(|page| {
            let trim_bottom = (REPORT_PAGE_HEIGHT * (pages - page)
                - short * REPORT_PAGE_HEIGHT / CONSTRUCTS_PER_PAGE)
                .max(0);
            let trim_top = REPORT_PAGE_HEIGHT * page;
            let trim = format!("trim={{ 0 {trim_bottom} 0 {trim_top} }}");
            format!("\\includegraphics[width=\\textwidth, {trim}, clip]{{{pdf_name}}}\n")
        })
        .collect()
}

/// Fills `{{design}}` and `{{comment}}` in the template and inserts the page
/// includes right before `\end{document}`.
pub fn render_report_tex(template: &str, pdf_name: &str, design: &str, size: usize) -> String {
    let comment = format!("Library size={size}");
    let mut out = String::with_capacity(template.len());
    for line in template.split_inclusive('\n') {
        let line = line
            .replace("{{design}}", design)
            .replace("{{comment}}", &comment);
        if line.starts_with("\\end{document}") {
            for include in report_page_includes(pdf_name, size) {
                out.push_str(&include);
            }
        }
        out.push_str(&line);
    }
    out
}

pub fn write_report_tex(pdf: &Path, design: &str, size: usize, template: &str) -> Result<PathBuf> {
    let tex = report_tex_path(pdf);
    let pdf_name = pdf
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    fs::write(&tex, render_report_tex(template, &pdf_name, design, size))?;
    Ok(tex)
}

pub fn typeset_report(tex: &Path, timeout: Duration) -> Result<()> {
    let pdflatex = resolve_tool_executable(PDFLATEX_ENV_BIN, DEFAULT_PDFLATEX_BIN);
    let tex = fs::canonicalize(tex)?;
    let dir = tex.parent().map(Path::to_path_buf).unwrap_or_default();
    ToolCommand::new(&pdflatex, timeout)
        .arg("-interaction=nonstopmode")
        .arg(tex.to_string_lossy())
        .current_dir(dir)
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_page_includes() {
        let pages = report_page_includes("lib.pdf", 20);
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("trim={ 0 3000 0 0 }"));
        assert!(pages[1].contains("trim={ 0 1500 0 1500 }"));
        assert!(pages[1].ends_with("{lib.pdf}\n"));
        assert!(report_page_includes("lib.pdf", 9).is_empty());
    }

    #[test]
    fn test_render_report_tex() {
        let tex = render_report_tex(DEFAULT_REPORT_TEMPLATE, "lib.pdf", "SBC", 10);
        assert!(tex.contains("Pathway library SBC"));
        assert!(tex.contains("Library size=10"));
        let include = tex.find("\\includegraphics").unwrap();
        let end = tex.find("\\end{document}").unwrap();
        assert!(include < end);
    }

    #[test]
    fn test_write_report_tex() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("lib.pdf");
        let tex = write_report_tex(&pdf, "SBC", 10, DEFAULT_REPORT_TEMPLATE).unwrap();
        assert_eq!(tex.file_name().unwrap(), "lib_report.tex");
        assert!(fs::read_to_string(tex).unwrap().contains("{lib.pdf}"));
    }

    #[test]
    fn test_missing_tool_fails() {
        let result = ToolCommand::new("viscad-no-such-tool", Duration::from_secs(1)).run();
        assert!(matches!(result, Err(VisError::ExternalTool { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_tool_exit_status() {
        assert!(ToolCommand::new("true", Duration::from_secs(5)).run().is_ok());
        assert!(ToolCommand::new("false", Duration::from_secs(5)).run().is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_tool_timeout() {
        let started = Instant::now();
        let result = ToolCommand::new("sleep", Duration::from_millis(100))
            .arg("5")
            .run();
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
