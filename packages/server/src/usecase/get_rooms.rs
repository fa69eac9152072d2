//! UseCase: 稼働中のルーム一覧

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomSnapshot};

pub struct GetRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム ID 順の一覧
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.registry.rooms().await
    }
}
