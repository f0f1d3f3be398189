/// Generate minibatch intervals
/// * `ntot` - number of total samples
/// * `batch_size` - the size of each batch
pub fn generate_minibatch_intervals(ntot: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let batch_size = batch_size.max(1);
    let num_batches = ntot.div_ceil(batch_size);
    (0..num_batches)
        .map(|b| {
            let lb: usize = b * batch_size;
            let ub: usize = ((b + 1) * batch_size).min(ntot);
            (lb, ub)
        })
        .collect::<Vec<_>>()
}

/// Split `ntot` items into at most `nchunks` contiguous intervals of
/// near-equal size; the first `ntot % nchunks` chunks get one extra
/// item.
pub fn split_into_chunks(ntot: usize, nchunks: usize) -> Vec<(usize, usize)> {
    let nchunks = nchunks.clamp(1, ntot.max(1));
    let base = ntot / nchunks;
    let extra = ntot % nchunks;

    let mut lb = 0;
    (0..nchunks)
        .map(|c| {
            let ub = lb + base + usize::from(c < extra);
            let interval = (lb, ub);
            lb = ub;
            interval
        })
        .filter(|&(lb, ub)| ub > lb)
        .collect()
}
