use std::sync::Arc;

use crate::mutation::MutationPolicy;

pub(crate) struct ApiServerState {
    pub(crate) policy: Arc<dyn MutationPolicy>,
}
