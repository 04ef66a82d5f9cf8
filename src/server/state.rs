use std::sync::Arc;

use crate::actors::Limits;
use crate::catalog::Catalog;
use crate::clients::{NotifierClient, OrderClient};

pub struct State {
    pub orders: OrderClient,
    pub notifier: NotifierClient,
    pub catalog: Catalog,
    pub limits: Limits,
}

impl State {
    pub fn new(orders: OrderClient, notifier: NotifierClient, limits: Limits) -> Arc<Self> {
        Arc::new(Self {
            orders,
            notifier,
            catalog: Catalog::default(),
            limits,
        })
    }
}
