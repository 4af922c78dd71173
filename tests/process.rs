//! Process lifecycle through the kernel context.

use zaplet_kernel::{Config, Kernel, Layout, Pid, ProcessError, ProcessState, Region};

fn kernel(max_processes: usize) -> Kernel {
    Kernel::new(Config {
        layout: Layout::with_sizes(1024, 8192).unwrap(),
        max_processes,
    })
}

#[test]
fn spawn_lookup_kill() {
    let mut k = kernel(8);
    let pid = k.spawn(1024, 0).unwrap();

    let process = k.lookup(pid).unwrap();
    assert_eq!(process.pid, pid);
    assert_eq!(process.state, ProcessState::Ready);
    assert_eq!(process.size, 1024);
    assert_eq!(k.space().owners().blocks_owned_by(pid), 256);

    k.kill(pid).unwrap();
    assert!(k.lookup(pid).is_none());
    assert_eq!(k.space().region(Region::User).used_blocks(), 0);

    // The blocks are free again for the next process.
    let next = k.spawn(1024, 0).unwrap();
    assert_eq!(k.lookup(next).unwrap().base, process.base);
    assert_ne!(next, pid);
}

#[test]
fn default_kernel_spawns_on_real_layout() {
    let mut k = Kernel::default();
    let pid = k.spawn(1024, 0).unwrap();
    assert_eq!(pid, Pid::new(0));
    assert_eq!(k.lookup(pid).unwrap().base, 16 * 1024 * 1024);
    k.kill(pid).unwrap();
}

#[test]
fn killing_twice_is_reported() {
    let mut k = kernel(8);
    let pid = k.spawn(64, 0).unwrap();
    k.kill(pid).unwrap();
    assert_eq!(k.kill(pid), Err(ProcessError::NotFound { op: "kill", pid }));
}

#[test]
fn processes_get_disjoint_regions() {
    let mut k = kernel(8);
    let a = k.spawn(100, 0).unwrap();
    let b = k.spawn(100, 0).unwrap();
    let pa = k.lookup(a).unwrap();
    let pb = k.lookup(b).unwrap();
    assert!(pa.base + pa.size <= pb.base);
    assert_eq!(k.processes().len(), 2);
}

#[test]
fn pid_space_is_bounded_by_capacity() {
    let mut k = kernel(2);
    let a = k.spawn(4, 0).unwrap();
    k.spawn(4, 0).unwrap();
    k.kill(a).unwrap();
    assert_eq!(k.spawn(4, 0), Err(ProcessError::TableFull { capacity: 2 }));
}

#[test]
#[should_panic(expected = "out of memory: user region")]
fn spawn_beyond_user_memory_is_fatal() {
    let mut k = kernel(8);
    let _ = k.spawn(8192, 0);
    let _ = k.spawn(4, 0);
}
