use bytes::Bytes;
use rustc_hash::FxHashMap;

use super::app_registry::AppRegistry;
use crate::error::ShimError;
use crate::protocol::openai_chat::{ModelList, ModelObject};

const MODEL_OBJECT: &str = "model";
const LIST_OBJECT: &str = "list";
const OWNED_BY: &str = "bailian";

/// `/v1/models` bodies rendered once at startup.
#[derive(Debug)]
pub(crate) struct ModelsCatalog {
    list_body: Bytes,
    model_bodies: FxHashMap<String, Bytes>,
}

impl ModelsCatalog {
    pub(crate) fn build(registry: &AppRegistry, created: u64) -> Result<Self, ShimError> {
        let data: Vec<ModelObject> = registry
            .iter()
            .map(|app| ModelObject {
                id: app.model.clone(),
                object: MODEL_OBJECT.to_string(),
                created,
                owned_by: OWNED_BY.to_string(),
                permission: Vec::new(),
                root: app.model.clone(),
                parent: None,
                description: app.description.clone(),
            })
            .collect();

        let mut model_bodies =
            FxHashMap::with_capacity_and_hasher(data.len(), Default::default());
        for model in &data {
            model_bodies.insert(model.id.clone(), Bytes::from(encode(model)?));
        }

        let list = ModelList {
            object: LIST_OBJECT.to_string(),
            data,
        };
        Ok(Self {
            list_body: Bytes::from(encode(&list)?),
            model_bodies,
        })
    }

    #[must_use]
    pub(crate) fn list_body(&self) -> Bytes {
        self.list_body.clone()
    }

    #[must_use]
    pub(crate) fn model_body(&self, model: &str) -> Option<Bytes> {
        self.model_bodies.get(model).cloned()
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ShimError> {
    serde_json::to_vec(value)
        .map_err(|err| ShimError::Internal(format!("Failed to encode models response: {err}")))
}
