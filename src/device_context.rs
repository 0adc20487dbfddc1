use std::{future::Future, sync::Arc};

use wgpu::{
    Adapter, Backends, Device, DeviceDescriptor, Instance, InstanceDescriptor, InstanceFlags,
    Limits, MemoryHints, PowerPreference, Queue, RequestAdapterOptions, Surface,
};

use crate::ClockError;

pub(crate) fn wait_async<F: Future>(fut: F) -> F::Output {
    pollster::block_on(fut)
}

fn gpu_summary(vendor: u32, name: &str, backend: wgpu::Backend) -> String {
    format!("GPU: {:#06x}, {}, backend {:?}", vendor, name, backend)
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub power_preference: PowerPreference,
    pub memory_hints: MemoryHints,
    pub features: wgpu::Features,
    pub limits: Limits,
    pub backends: Backends,
    pub instance_flags: InstanceFlags,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            power_preference: PowerPreference::default(),
            memory_hints: MemoryHints::Performance,
            features: wgpu::Features::empty(),
            // The clock needs nothing beyond what every backend offers
            limits: Limits::downlevel_webgl2_defaults(),
            backends: Backends::all(),
            instance_flags: InstanceFlags::from_build_config(),
        }
    }
}

#[derive(Debug)]
pub struct DeviceContext {
    config: DeviceConfig,
    instance: Instance,
    adapter: Adapter,
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl DeviceContext {
    pub fn new(config: &DeviceConfig) -> Result<DeviceContext, ClockError> {
        let instance = Instance::new(&InstanceDescriptor {
            backends: config.backends,
            flags: config.instance_flags,
            ..Default::default()
        });
        let (adapter, device, queue) =
            Self::create_adapter_device_and_queue(config, &instance, None)?;
        Ok(Self {
            config: config.clone(),
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// If adapter, device and queue has been created without a window (surface), recreate them
    /// once you have a surface to ensure compatibility of queue families.
    pub fn reconfigure_with_surface(&mut self, surface: &Surface) -> Result<(), ClockError> {
        let (adapter, device, queue) =
            Self::create_adapter_device_and_queue(&self.config, &self.instance, Some(surface))?;
        self.adapter = adapter;
        self.device = Arc::new(device);
        self.queue = Arc::new(queue);
        Ok(())
    }

    fn create_adapter_device_and_queue(
        config: &DeviceConfig,
        instance: &Instance,
        surface: Option<&Surface>,
    ) -> Result<(Adapter, Device, Queue), ClockError> {
        let adapter = wait_async(instance.request_adapter(&RequestAdapterOptions {
            power_preference: config.power_preference,
            force_fallback_adapter: false,
            compatible_surface: surface,
        }))
        .map_err(ClockError::Adapter)?;

        let info = adapter.get_info();
        log::info!("{}", gpu_summary(info.vendor, &info.name, info.backend));
        log::debug!("{:?}, driver {} {}", info.device_type, info.driver, info.driver_info);

        let (device, queue) = wait_async(adapter.request_device(&DeviceDescriptor {
            label: Some("Clock Device"),
            required_features: config.features,
            required_limits: config.limits.clone().using_resolution(adapter.limits()),
            memory_hints: config.memory_hints.clone(),
            ..Default::default()
        }))
        .map_err(ClockError::Device)?;

        // Report instead of panicking, the frame loop keeps going
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("wgpu: {}", error);
        }));

        Ok((adapter, device, queue))
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_summary_names_vendor_first() {
        assert_eq!(
            gpu_summary(0x10de, "GeForce RTX 3060", wgpu::Backend::Vulkan),
            "GPU: 0x10de, GeForce RTX 3060, backend Vulkan"
        );
    }
}
