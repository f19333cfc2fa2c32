use std::sync::Arc;

use crate::logic::{PhotoService, SessionService, UploadConfig, UploadPipeline, UserService};
use crate::store::traits::Store;

/// Services shared by every handler. The services are wired leaf-first so
/// each one validates parents through the service one level up.
pub struct AppContext<S> {
    pub users: UserService<S>,
    pub sessions: SessionService<S>,
    pub photos: PhotoService<S>,
    pub uploads: UploadPipeline<S>,
}

impl<S: Store> AppContext<S> {
    pub fn new(store: Arc<S>, upload_config: UploadConfig) -> Self {
        let users = UserService::new(Arc::clone(&store));
        let sessions = SessionService::new(Arc::clone(&store), users.clone());
        let photos = PhotoService::new(store, sessions.clone());
        let uploads = UploadPipeline::new(upload_config, photos.clone());

        Self {
            users,
            sessions,
            photos,
            uploads,
        }
    }
}

pub type AppState<S> = Arc<AppContext<S>>;
