// Optional DockerRepo tests when Docker daemon is available

use homeserver_monitor::docker_repo::DockerRepo;

#[tokio::test]
async fn docker_repo_connect_and_list_running() {
    let repo = match DockerRepo::connect() {
        Ok(r) => r,
        Err(_) => return, // Skip when Docker is not available (e.g. CI without Docker)
    };
    // Empty when no containers run or the daemon is unreachable.
    let usage = repo.list_running_usage().await;
    for c in &usage {
        assert!((0.0..=100.0).contains(&c.cpu_percent));
        assert!(c.memory_limit_bytes == 0 || c.memory_usage_bytes <= c.memory_limit_bytes);
    }
    assert!(usage.windows(2).all(|w| w[0].name <= w[1].name));
}
