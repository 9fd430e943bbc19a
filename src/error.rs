use crate::{config, dispatcher, request};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E {
    #[error("{0}")]
    Dispatcher(dispatcher::E),
    #[error("{0}")]
    Request(request::E),
    #[error("{0}")]
    Config(config::E),
}

impl From<dispatcher::E> for E {
    fn from(err: dispatcher::E) -> Self {
        E::Dispatcher(err)
    }
}

impl From<request::E> for E {
    fn from(err: request::E) -> Self {
        E::Request(err)
    }
}

impl From<config::E> for E {
    fn from(err: config::E) -> Self {
        E::Config(err)
    }
}
