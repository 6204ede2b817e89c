//! Camera capture through `getUserMedia`
//!
//! The video element feeds two consumers: the visible canvas draws it
//! mirrored every frame, and `capture` shrinks it onto a small offscreen
//! canvas for motion detection.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

use super::CameraAccess;
use crate::consts::{MOTION_HEIGHT, MOTION_WIDTH};
use crate::settings::FacingMode;
use crate::sim::MotionFrame;

/// `HTMLMediaElement.HAVE_ENOUGH_DATA`
const HAVE_ENOUGH_DATA: u16 = 4;

pub struct Camera {
    video: HtmlVideoElement,
    motion_canvas: HtmlCanvasElement,
    motion_ctx: CanvasRenderingContext2d,
    access: CameraAccess,
}

impl Camera {
    /// Wrap `video` and create the offscreen motion canvas
    pub fn new(document: &Document, video: HtmlVideoElement) -> Result<Self, JsValue> {
        let motion_canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        motion_canvas.set_width(MOTION_WIDTH);
        motion_canvas.set_height(MOTION_HEIGHT);
        let motion_ctx = motion_canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        video.set_autoplay(true);
        video.set_muted(true);
        video.set_attribute("playsinline", "")?;

        Ok(Self {
            video,
            motion_canvas,
            motion_ctx,
            access: CameraAccess::Pending,
        })
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Permission was granted and a stream is attached
    pub fn granted(&self) -> bool {
        self.access.is_granted()
    }

    /// Frames are flowing
    pub fn ready(&self) -> bool {
        self.granted() && self.video.ready_state() >= HAVE_ENOUGH_DATA
    }

    /// Show `stream` in the video element, replacing any previous one
    pub fn attach(&mut self, stream: &MediaStream) {
        self.stop_tracks();
        self.video.set_src_object(Some(stream));
        // Autoplay may reject until a user gesture; readiness is polled anyway
        if let Err(err) = self.video.play() {
            log::warn!("Video play() failed: {:?}", err);
        }
        self.access.on_stream_attached();
    }

    /// A stream request was rejected. Returns true when the previously
    /// attached stream keeps running.
    pub fn request_failed(&mut self) -> bool {
        self.access.on_request_failed()
    }

    fn stop_tracks(&self) {
        let Some(stream) = self.video.src_object() else {
            return;
        };
        let tracks: Array = stream.get_tracks();
        for track in tracks.iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        self.video.set_src_object(None);
    }

    /// Mirrored low-resolution snapshot for the motion detector
    pub fn capture(&self) -> Option<MotionFrame> {
        if !self.ready() {
            return None;
        }
        let (w, h) = (MOTION_WIDTH as f64, MOTION_HEIGHT as f64);
        let ctx = &self.motion_ctx;

        ctx.save();
        ctx.scale(-1.0, 1.0).ok()?;
        let drawn =
            ctx.draw_image_with_html_video_element_and_dw_and_dh(&self.video, -w, 0.0, w, h);
        ctx.restore();
        if let Err(err) = drawn {
            log::warn!("Motion capture failed: {:?}", err);
            return None;
        }

        let image = ctx.get_image_data(0.0, 0.0, w, h).ok()?;
        let (width, height) = (self.motion_canvas.width(), self.motion_canvas.height());
        match MotionFrame::from_rgba(width, height, image.data().0) {
            Ok(frame) => Some(frame),
            Err(err) => {
                log::warn!("Discarding camera frame: {}", err);
                None
            }
        }
    }
}

/// Ask the browser for a camera stream facing `facing`
pub async fn request_stream(facing: FacingMode) -> Result<MediaStream, JsValue> {
    let navigator = web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .navigator();
    let devices = navigator.media_devices()?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video_constraints(facing)?);
    constraints.set_audio(&JsValue::FALSE);

    let promise = devices.get_user_media_with_constraints(&constraints)?;
    let stream = JsFuture::from(promise).await?.dyn_into::<MediaStream>()?;
    log::info!("Camera stream acquired ({})", facing.as_str());
    Ok(stream)
}

fn video_constraints(facing: FacingMode) -> Result<JsValue, JsValue> {
    let ideal = |value: u32| -> Result<Object, JsValue> {
        let obj = Object::new();
        Reflect::set(&obj, &"ideal".into(), &value.into())?;
        Ok(obj)
    };

    let video = Object::new();
    Reflect::set(&video, &"facingMode".into(), &facing.as_str().into())?;
    Reflect::set(&video, &"width".into(), &ideal(1280)?)?;
    Reflect::set(&video, &"height".into(), &ideal(720)?)?;
    Ok(video.into())
}
