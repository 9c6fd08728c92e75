pub mod mock_device;
pub mod shaders;

use std::sync::Arc;
use crate::renderer::contexts::device_ctx::{GpuDevice, RenderDeviceContext};
use crate::renderer::test_support::mock_device::MockDevice;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh mock plus a context sharing it.
pub fn mock_context() -> (Arc<MockDevice>, RenderDeviceContext) {
    init_logger();
    let mock = Arc::new(MockDevice::new());
    let device: Arc<dyn GpuDevice> = mock.clone();
    (mock, RenderDeviceContext::new(device))
}
