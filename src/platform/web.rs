//! Browser glue for motion sensing and vibration

use glam::Vec3;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DeviceAcceleration, DeviceMotionEvent};

use super::{Haptics, MotionPermission};
use crate::sim::MotionSample;

// iOS 13+ gates motion events behind an explicit, gesture-initiated prompt
#[wasm_bindgen(inline_js = "
    export async function request_motion_permission() {
        if (typeof DeviceMotionEvent === 'undefined') {
            return 'unsupported';
        }
        if (typeof DeviceMotionEvent.requestPermission === 'function') {
            try {
                return await DeviceMotionEvent.requestPermission();
            } catch (e) {
                console.warn('Motion permission request failed:', e);
                return 'denied';
            }
        }
        return 'granted';
    }
")]
extern "C" {
    fn request_motion_permission() -> js_sys::Promise;
}

/// Ask for motion access. Must be called from a user gesture on iOS.
pub async fn request_permission() -> MotionPermission {
    let response = JsFuture::from(request_motion_permission()).await;
    let permission = match response {
        Ok(value) => MotionPermission::from_response(value.as_string().as_deref()),
        Err(e) => {
            log::warn!("Motion permission promise rejected: {:?}", e);
            MotionPermission::Denied
        }
    };
    log::info!("Motion permission: {:?}", permission);
    permission
}

fn read_axes(acc: Option<DeviceAcceleration>) -> Option<Vec3> {
    acc.map(|a| {
        Vec3::new(
            a.x().unwrap_or(0.0) as f32,
            a.y().unwrap_or(0.0) as f32,
            a.z().unwrap_or(0.0) as f32,
        )
    })
}

pub fn sample_from_event(event: &DeviceMotionEvent) -> MotionSample {
    MotionSample {
        acceleration_including_gravity: read_axes(event.acceleration_including_gravity()),
        acceleration: read_axes(event.acceleration()),
    }
}

/// `devicemotion` subscription, removed from the window when dropped
pub struct MotionListener {
    window: web_sys::Window,
    closure: Closure<dyn FnMut(DeviceMotionEvent)>,
}

impl MotionListener {
    pub fn attach<F>(mut on_sample: F) -> Option<Self>
    where
        F: FnMut(MotionSample) + 'static,
    {
        let window = web_sys::window()?;
        let closure = Closure::<dyn FnMut(_)>::new(move |event: DeviceMotionEvent| {
            on_sample(sample_from_event(&event));
        });
        if let Err(e) = window
            .add_event_listener_with_callback("devicemotion", closure.as_ref().unchecked_ref())
        {
            log::warn!("Could not listen for devicemotion: {:?}", e);
            return None;
        }
        Some(Self { window, closure })
    }
}

impl Drop for MotionListener {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "devicemotion",
            self.closure.as_ref().unchecked_ref(),
        );
    }
}

/// `navigator.vibrate`; silently does nothing where unsupported
#[derive(Debug, Clone, Copy, Default)]
pub struct WebHaptics;

impl Haptics for WebHaptics {
    fn pulse(&self, millis: u32) {
        if let Some(window) = web_sys::window() {
            let _ = window.navigator().vibrate_with_duration(millis);
        }
    }
}
