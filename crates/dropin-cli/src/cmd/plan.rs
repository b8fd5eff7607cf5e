//! Plan command

use anyhow::{Context, Result};
use dropin_core::plan::InstallPlan;
use dropin_core::{InstallError, Installer, Placement};
use std::fmt::Write as _;
use std::path::Path;

use crate::OutputFormat;

/// Resolve the plan at `file` and print the placement.
pub fn plan(file: &Path, main: Option<&str>, format: OutputFormat) -> Result<()> {
    let plan = InstallPlan::load(file)?;
    let (mut request, repository) = plan.into_parts()?;
    if let Some(main) = main {
        request.main_package = main.to_string();
    }

    tracing::info!(
        "Installing {} units from {} (main package {})",
        request.reactor.len(),
        file.display(),
        request.main_package
    );

    let placement = match Installer::new(&repository).install(&request) {
        Ok(placement) => placement,
        Err(err) => {
            if let InstallError::UnmergedVirtualPackages { dump, .. } = &err {
                eprint!("{dump}");
            }
            return Err(err).with_context(|| format!("Failed to install {}", file.display()));
        }
    };

    match format {
        OutputFormat::Text => print!("{}", render_text(&placement)),
        OutputFormat::Json => println!("{}", placement.to_json().context("Failed to serialize placement")?),
    }
    Ok(())
}

/// Plain listing of every dropin.
pub fn render_text(placement: &Placement) -> String {
    let mut out = String::new();
    for dropin in &placement.dropins {
        let _ = writeln!(out, "{} ({})", dropin.name, dropin.path.display());
        for provide in &dropin.provides {
            let _ = write!(out, "  + {} {} -> {}", provide.id, provide.version, provide.path.display());
            if let Some(requires) = provide.requires() {
                let _ = write!(out, " [requires {requires}]");
            }
            out.push('\n');
        }
        for link in &dropin.symlinks {
            let target = link
                .target
                .as_ref()
                .map_or_else(|| "?".to_string(), |t| t.display().to_string());
            let _ = writeln!(out, "  @ {} => {}", link.link_name, target);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropin_core::{Dropin, Provide, REQUIRES_PROPERTY, SymlinkRef};
    use std::path::PathBuf;

    #[test]
    fn test_render_text() {
        let placement = Placement {
            dropins: vec![Dropin {
                name: "main".into(),
                path: PathBuf::from("/dropins/main"),
                provides: vec![Provide {
                    id: "a".into(),
                    version: "1.0.0".into(),
                    path: PathBuf::from("/dropins/main/eclipse/plugins/a_1.0.0.jar"),
                    properties: [(REQUIRES_PROPERTY.to_string(), "u".to_string())]
                        .into_iter()
                        .collect(),
                }],
                symlinks: vec![SymlinkRef {
                    id: "u".into(),
                    version: "1.0.0".into(),
                    link_name: "u_1.0.0.jar".into(),
                    target: None,
                }],
            }],
        };

        let text = render_text(&placement);
        assert_eq!(
            text,
            "main (/dropins/main)\n  + a 1.0.0 -> /dropins/main/eclipse/plugins/a_1.0.0.jar [requires u]\n  @ u_1.0.0.jar => ?\n"
        );
    }
}
