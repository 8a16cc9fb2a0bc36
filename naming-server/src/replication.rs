//! Read-triggered replication, per spec.md §4.H.
//!
//! Every shared-lock acquisition on a file bumps its read count. Once the
//! count crosses a multiple of 20, the naming server computes how many
//! replicas the file *should* have and, if short by one, commands a single
//! registered storage server to copy it. Only one replica is created per
//! acquisition — a burst of reads grows the replica set gradually rather
//! than all at once.

const READ_BUCKET: u64 = 20;

/// Rounds `read_count` to the nearest multiple of [`READ_BUCKET`].
fn coarse_read_count(read_count: u64) -> u64 {
    let buckets = (read_count as f64 / READ_BUCKET as f64).round() as u64;
    buckets * READ_BUCKET
}

/// The number of replicas (not counting the primary copy) a file with
/// `read_count` reads and a replication factor of `alpha` should have,
/// capped by `other_storage_servers` — the number of registered storage
/// servers besides the one holding the primary, since none of them can host
/// a second copy of a file they already hold.
pub fn desired_replica_count(read_count: u64, alpha: f64, other_storage_servers: usize) -> usize {
    let coarse = coarse_read_count(read_count) as f64;
    let desired = (alpha * coarse).floor() as usize;
    desired.min(other_storage_servers)
}

/// Whether a read-lock acquisition that brings a file's read count to
/// `read_count` should trigger creating one more replica, given it
/// currently has `current_replica_count`.
pub fn should_replicate(
    read_count: u64,
    current_replica_count: usize,
    alpha: f64,
    other_storage_servers: usize,
) -> bool {
    current_replica_count < desired_replica_count(read_count, alpha, other_storage_servers)
}
