use crate::store::FileStore;
use crate::view::WeekView;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedView = Arc<Mutex<WeekView<FileStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub view: SharedView,
}

impl AppState {
    pub fn new(view: WeekView<FileStore>) -> Self {
        Self {
            view: Arc::new(Mutex::new(view)),
        }
    }
}
