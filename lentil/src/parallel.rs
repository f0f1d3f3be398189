use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use matrix_util::utils::split_into_chunks;
use rayon::prelude::*;
use std::sync::mpsc::{self, Sender};

/// Run `f` over contiguous chunks of `jobs` on a dedicated pool of
/// `n_jobs` threads (all cores if `None`).
///
/// Each worker gets its own `Sender` and reports how many `unit`s it
/// has finished; a monitor thread drains the channel into a progress
/// bar. Results come back in chunk order.
///
/// * `jobs` - pre-sliced units of work
/// * `n_jobs` - number of worker threads
/// * `unit` - label of one job shown next to the bar
/// * `show_progress` - draw the progress bar on stderr
/// * `f` - `(chunk, sender) -> result`
///
pub fn parallelize<J, R, F>(
    jobs: &[J],
    n_jobs: Option<usize>,
    unit: &str,
    show_progress: bool,
    f: F,
) -> anyhow::Result<Vec<R>>
where
    J: Sync,
    R: Send,
    F: Fn(&[J], Sender<usize>) -> R + Sync,
{
    let n_jobs = n_jobs.unwrap_or_else(num_cpus::get).max(1);
    let chunks = split_into_chunks(jobs.len(), n_jobs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_jobs.min(chunks.len().max(1)))
        .build()?;

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg} [{elapsed_precise}]",
    )?);
    pb.set_message(unit.to_string());
    if !show_progress {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let (tx, rx) = mpsc::channel::<usize>();
    let tasks: Vec<_> = chunks
        .into_iter()
        .map(|(lb, ub)| (&jobs[lb..ub], tx.clone()))
        .collect();
    drop(tx);

    let results = std::thread::scope(|scope| {
        let monitor = pb.clone();
        scope.spawn(move || {
            for done in rx.iter() {
                monitor.inc(done as u64);
            }
        });

        pool.install(|| {
            tasks
                .into_par_iter()
                .map(|(chunk, sender)| f(chunk, sender))
                .collect::<Vec<_>>()
        })
    });

    pb.finish_and_clear();
    Ok(results)
}
