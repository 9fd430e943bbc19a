mod dispatcher;
pub(crate) mod utils;

use ctor::ctor;

#[ctor]
fn logs() {
    let _ = env_logger::try_init();
}
