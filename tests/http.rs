use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekSnapshot {
    week_key: String,
    days: Vec<DaySnapshot>,
    week_total_minutes: i64,
    remaining_minutes: i64,
    clock: ClockState,
    form: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DaySnapshot {
    index: u8,
    is_today: bool,
    show_clock: bool,
    blocks: Vec<BlockSnapshot>,
    total_minutes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockSnapshot {
    id: String,
    start_time: String,
    end_time: Option<String>,
    description: String,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClockState {
    is_clocked_in: bool,
    active_block_id: Option<String>,
}

impl WeekSnapshot {
    fn today(&self) -> &DaySnapshot {
        self.days.iter().find(|day| day.is_today).expect("today column")
    }
}

struct TestServer {
    base_url: String,
    data_dir: TempDir,
    child: Child,
}

impl TestServer {
    fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }
}

impl Drop for TestServer {
    // The data directory is removed after this, when `data_dir` drops.
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::{Once, OnceLock};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);
    static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

    /// The shared server lives in a static and is never dropped, so its
    /// process and data directory are cleaned up at exit.
    pub fn register(pid: u32, data_dir: PathBuf) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            let _ = DATA_DIR.set(data_dir);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
                libc::waitpid(pid, std::ptr::null_mut(), 0);
            }
        }
        if let Some(dir) = DATA_DIR.get() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("epoch_http_")
        .tempdir()
        .expect("create data dir")
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/week")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_dir = unique_data_dir();
    let child = Command::new(env!("CARGO_BIN_EXE_epoch"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", data_dir.path())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_dir,
        child,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    #[cfg(unix)]
    cleanup::register(server.child.id(), server.data_dir().to_path_buf());
    *guard = Some(Arc::clone(&server));
    server
}

async fn post(client: &Client, server: &TestServer, path: &str) -> reqwest::Response {
    client
        .post(format!("{}{path}", server.base_url))
        .send()
        .await
        .unwrap()
}

async fn this_week(client: &Client, server: &TestServer) -> WeekSnapshot {
    post(client, server, "/api/week/today").await.json().await.unwrap()
}

#[tokio::test]
async fn http_index_renders_week_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let snapshot = this_week(&client, &server).await;
    let body = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Epoch - Time Tracker"));
    assert!(body.contains(&format!(r#""weekKey":"{}""#, snapshot.week_key)));
    assert_eq!(snapshot.days.len(), 7);
    assert_eq!(snapshot.days.iter().filter(|day| day.show_clock).count(), 1);
}

#[tokio::test]
async fn http_form_adds_block_to_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = this_week(&client, &server).await;
    let today = before.today().index;

    let opened: WeekSnapshot = post(&client, &server, &format!("/api/days/{today}/form"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(opened.form["mode"], "adding");
    assert_eq!(opened.form["endTime"], "17:00");

    let rejected = client
        .post(format!("{}/api/form", server.base_url))
        .json(&serde_json::json!({ "startTime": "10:00", "endTime": "09:00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rejected.text().await.unwrap(), "End time must be after start time");

    let saved: WeekSnapshot = client
        .post(format!("{}/api/form", server.base_url))
        .json(&serde_json::json!({ "startTime": "00:00", "endTime": "00:30", "description": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(saved.form["mode"], "closed");
    let day = saved.today();
    assert_eq!(day.blocks.len(), before.today().blocks.len() + 1);
    assert_eq!(day.total_minutes, before.today().total_minutes + 30);
    assert_eq!(saved.week_total_minutes, before.week_total_minutes + 30);
    assert_eq!(saved.remaining_minutes, (2400 - saved.week_total_minutes).max(0));
    let first = &day.blocks[0];
    assert_eq!(first.start_time, "00:00");
    assert_eq!(first.description, "Work");

    let stored = std::fs::read_to_string(server.data_dir().join("epoch_time_data.json")).unwrap();
    assert!(stored.contains(&before.week_key));
}

#[tokio::test]
async fn http_future_week_rejects_add_form() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let current = this_week(&client, &server).await;
    let next: WeekSnapshot = post(&client, &server, "/api/week/next")
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(next.week_key, current.week_key);

    let response = post(&client, &server, "/api/days/0/form").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(&client, &server, "/api/days/7/form").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(this_week(&client, &server).await.week_key, current.week_key);
}

#[tokio::test]
async fn http_clock_in_then_out_closes_block() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = this_week(&client, &server).await;
    assert!(!before.clock.is_clocked_in);

    let clocked_in: WeekSnapshot = post(&client, &server, "/api/clock/in")
        .await
        .json()
        .await
        .unwrap();
    assert!(clocked_in.clock.is_clocked_in);
    let id = clocked_in.clock.active_block_id.clone().expect("active block id");
    let open = clocked_in
        .today()
        .blocks
        .iter()
        .find(|block| block.id == id)
        .expect("open block");
    assert!(open.is_active);
    assert_eq!(open.end_time, None);

    let again = post(&client, &server, "/api/clock/in").await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let today = clocked_in.today().index;
    let edit = post(&client, &server, &format!("/api/days/{today}/blocks/{id}/edit")).await;
    assert_eq!(edit.status(), StatusCode::CONFLICT);

    let clocked_out: WeekSnapshot = post(&client, &server, "/api/clock/out")
        .await
        .json()
        .await
        .unwrap();
    assert!(!clocked_out.clock.is_clocked_in);
    let closed = clocked_out
        .today()
        .blocks
        .iter()
        .find(|block| block.id == id)
        .expect("closed block");
    assert!(!closed.is_active);
    assert!(closed.end_time.is_some());
    assert_eq!(closed.description, "Work");

    let again = post(&client, &server, "/api/clock/out").await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_dropped_server_removes_its_data_dir() {
    let server = spawn_server().await;
    let client = Client::new();
    let response = post(&client, &server, "/api/clock/in").await;
    assert!(response.status().is_success());

    let data_dir = server.data_dir().to_path_buf();
    assert!(data_dir.join("epoch_clock_state.json").exists());

    drop(server);
    assert!(!data_dir.exists());
}
