//! NUMA topology discovery, thread binding, and per-node storage.
//!
//! On Linux the node layout comes from sysfs and worker threads are pinned
//! with `sched_setaffinity`; elsewhere the machine is treated as a single
//! node and binding is a no-op.

use once_cell::sync::Lazy;

/// CPUs belonging to one NUMA node.
#[derive(Clone, Debug)]
struct Node {
    cpus: Vec<usize>,
}

static TOPOLOGY: Lazy<Vec<Node>> = Lazy::new(discover);

#[cfg(target_os = "linux")]
fn discover() -> Vec<Node> {
    let mut nodes = Vec::new();

    if let Ok(entries) = std::fs::read_dir("/sys/devices/system/node") {
        let mut dirs: Vec<_> = entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                let id: usize = name.strip_prefix("node")?.parse().ok()?;
                Some((id, e.path()))
            })
            .collect();
        dirs.sort_by_key(|(id, _)| *id);

        for (_, path) in dirs {
            if let Ok(list) = std::fs::read_to_string(path.join("cpulist")) {
                let cpus = parse_cpu_list(list.trim());
                if !cpus.is_empty() {
                    nodes.push(Node { cpus });
                }
            }
        }
    }

    if nodes.is_empty() {
        nodes.push(fallback_node());
    }

    nodes
}

#[cfg(not(target_os = "linux"))]
fn discover() -> Vec<Node> {
    vec![fallback_node()]
}

fn fallback_node() -> Node {
    let count = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    Node {
        cpus: (0..count).collect(),
    }
}

/// Parse a sysfs cpulist like "0-3,8-11"
#[allow(dead_code)]
fn parse_cpu_list(list: &str) -> Vec<usize> {
    let mut cpus = Vec::new();

    for part in list.split(',').filter(|p| !p.is_empty()) {
        if let Some((lo, hi)) = part.split_once('-') {
            if let (Ok(lo), Ok(hi)) = (lo.parse::<usize>(), hi.parse::<usize>()) {
                cpus.extend(lo..=hi);
            }
        } else if let Ok(cpu) = part.parse::<usize>() {
            cpus.push(cpu);
        }
    }

    cpus
}

/// Number of NUMA nodes visible to the process.
#[must_use]
pub fn node_count() -> usize {
    TOPOLOGY.len()
}

/// The CPU a worker thread is mapped to, round-robin over the topology.
fn cpu_for_thread(thread_id: u32) -> (usize, usize) {
    let total: usize = TOPOLOGY.iter().map(|n| n.cpus.len()).sum();
    let mut idx = thread_id as usize % total;

    for (node, n) in TOPOLOGY.iter().enumerate() {
        if idx < n.cpus.len() {
            return (node, n.cpus[idx]);
        }
        idx -= n.cpus.len();
    }

    unreachable!()
}

/// The node a worker thread's storage should live on.
#[must_use]
pub fn node_for_thread(thread_id: u32) -> usize {
    cpu_for_thread(thread_id).0
}

/// Pin the calling thread to its assigned CPU.
#[cfg(target_os = "linux")]
pub fn bind_thread(thread_id: u32) {
    let (_, cpu) = cpu_for_thread(thread_id);

    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
    }
}

#[cfg(not(target_os = "linux"))]
pub fn bind_thread(_thread_id: u32) {}

/// One `T` per NUMA node, resolved by worker thread id.
pub struct NumaLocal<T> {
    per_node: Vec<T>,
}

impl<T: Default> NumaLocal<T> {
    #[must_use]
    pub fn new() -> Self {
        NumaLocal {
            per_node: (0..node_count()).map(|_| T::default()).collect(),
        }
    }
}

impl<T: Default> Default for NumaLocal<T> {
    fn default() -> Self {
        NumaLocal::new()
    }
}

impl<T> NumaLocal<T> {
    #[must_use]
    pub fn get(&self, thread_id: u32) -> &T {
        &self.per_node[node_for_thread(thread_id)]
    }
}
