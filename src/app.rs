use crate::config::{write_atomic, SimConfig};
use crate::lattice::{HexLattice, Snapshot, StepReport};
use crate::render::{Mosaic, TermGuard};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

pub struct RunOptions {
    pub config: SimConfig,
    pub live: bool,
    pub export: Option<PathBuf>,
}

pub fn run(opts: RunOptions) -> Result<()> {
    let cfg = &opts.config;
    cfg.validate()?;

    let mut lattice =
        HexLattice::new(cfg.radius, cfg.params()).context("could not build lattice")?;
    info!(
        radius = cfg.radius,
        cells = lattice.len(),
        iterations = cfg.iterations,
        beta = cfg.beta,
        gamma = cfg.gamma,
        "starting run"
    );

    let started = Instant::now();
    if opts.live {
        run_live(&mut lattice, cfg)?;
    } else {
        run_batch(&mut lattice, cfg.iterations);
        let mut out = io::stdout().lock();
        Mosaic::build(lattice.radius(), lattice.cells()).write_to(&mut out, cfg.enable_color)?;
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", summary_line(&lattice))?;
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "run finished");

    if let Some(path) = &opts.export {
        export_snapshot(&lattice.snapshot(), path)?;
        info!(path = %path.display(), "exported snapshot");
    }
    Ok(())
}

/// Step the lattice `iterations` times, logging progress every tenth of the run.
pub fn run_batch(lattice: &mut HexLattice, iterations: u64) -> Option<StepReport> {
    let mut progress = Progress::new(iterations);
    lattice.run_with(iterations, |r| progress.observe(r))
}

pub fn summary_line(lattice: &HexLattice) -> String {
    format!(
        "iteration {}  frozen {}/{}  total water {:.4}",
        lattice.iteration(),
        lattice.frozen_count(),
        lattice.len(),
        lattice.total_water()
    )
}

pub fn export_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let data = serde_json::to_vec_pretty(snapshot)?;
    write_atomic(path, &data).with_context(|| format!("could not write {}", path.display()))
}

struct Progress {
    total: u64,
    next_mark: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self {
            total,
            next_mark: Self::mark(total, 1),
        }
    }

    fn mark(total: u64, tenth: u64) -> u64 {
        (total * tenth / 10).max(1)
    }

    fn observe(&mut self, r: &StepReport) {
        if r.iteration < self.next_mark {
            return;
        }
        info!(
            iteration = r.iteration,
            of = self.total,
            frozen = r.frozen,
            receptive = r.receptive,
            total_water = r.total_water,
            "progress"
        );
        let tenth = (r.iteration * 10 / self.total.max(1)) + 1;
        self.next_mark = Self::mark(self.total, tenth).max(r.iteration + 1);
    }
}

/* -----------------------------
   Live view
------------------------------ */

fn run_live(lattice: &mut HexLattice, cfg: &SimConfig) -> Result<()> {
    let mut term = TermGuard::new().context("could not enter alternate screen")?;
    let frame = Duration::from_millis(cfg.frame_ms);
    let mut progress = Progress::new(cfg.iterations);

    while lattice.iteration() < cfg.iterations {
        let frame_start = Instant::now();
        if quit_requested(Duration::ZERO)? {
            return Ok(());
        }

        let remaining = cfg.iterations - lattice.iteration();
        let n = remaining.min(u64::from(cfg.steps_per_frame));
        lattice.run_with(n, |r| progress.observe(r));

        let hud = format!("snowflake  {}  q quit", summary_line(lattice));
        term.draw(
            &Mosaic::build(lattice.radius(), lattice.cells()),
            &hud,
            cfg.enable_color,
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            std::thread::sleep(frame - elapsed);
        }
    }

    let hud = format!("snowflake  {}  done, press any key", summary_line(lattice));
    term.draw(
        &Mosaic::build(lattice.radius(), lattice.cells()),
        &hud,
        cfg.enable_color,
    )?;
    wait_for_key()?;
    Ok(())
}

fn quit_requested(timeout: Duration) -> Result<bool> {
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press
                && matches!(k.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn wait_for_key() -> Result<()> {
    loop {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn batch_runs_requested_iterations() {
        let cfg = SimConfig {
            radius: 4,
            iterations: 25,
            ..Default::default()
        };
        let mut lattice = HexLattice::new(cfg.radius, cfg.params()).unwrap();
        let last = run_batch(&mut lattice, cfg.iterations).unwrap();
        assert_eq!(last.iteration, 25);
        assert_eq!(lattice.iteration(), 25);
    }

    #[test]
    fn progress_marks_advance_by_tenths() {
        let mut p = Progress::new(100);
        assert_eq!(p.next_mark, 10);
        let report = |iteration| StepReport {
            iteration,
            receptive: 0,
            frozen: 0,
            total_water: 0.0,
        };
        p.observe(&report(10));
        assert_eq!(p.next_mark, 20);
        p.observe(&report(15));
        assert_eq!(p.next_mark, 20);

        let mut short = Progress::new(3);
        short.observe(&report(1));
        assert_eq!(short.next_mark, 2);
    }

    #[test]
    fn summary_mentions_counts() {
        let lattice = HexLattice::new(1, SimConfig::default().params()).unwrap();
        assert_eq!(
            summary_line(&lattice),
            format!("iteration 0  frozen 1/7  total water {:.4}", 1.0 + 6.0 * 0.4)
        );
    }

    #[test]
    fn export_writes_readable_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flake.json");
        let mut lattice = HexLattice::new(3, SimConfig::default().params()).unwrap();
        lattice.run(10);
        export_snapshot(&lattice.snapshot(), &path).unwrap();

        let back: Snapshot = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let snap = lattice.snapshot();
        assert_eq!(back.radius, snap.radius);
        assert_eq!(back.iteration, 10);
        assert_eq!(back.cells.len(), snap.cells.len());
        for (a, b) in back.cells.iter().zip(&snap.cells) {
            assert_eq!(a.position, b.position);
            assert!((a.water - b.water).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let opts = RunOptions {
            config: SimConfig {
                beta: 2.0,
                ..Default::default()
            },
            live: false,
            export: None,
        };
        assert!(run(opts).is_err());
    }
}
