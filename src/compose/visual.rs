use crate::assets::decode::{PreparedImage, prepare_rgba_frame};
use crate::assets::media::{MediaBackend, VideoFrameStream, VideoSourceInfo};
use crate::assets::resolve::{ResolvedScene, ResolvedVisual, StillFile};
use crate::compose::geometry::{
    LayerPose, canvas_center, clamp_offset_to_cover, cover_scale, inset_scale, layer_affine,
};
use crate::compose::motion::{KenBurns, MinimalistMotion, MotionChooser};
use crate::compose::style::{StyleProfile, VisualLayout};
use crate::foundation::core::{Affine, Canvas, Fps, Rgba8Premul};
use crate::foundation::error::ReelResult;
use crate::render::cpu::{draw_image, fill_canvas, image_paint};

/// Pixel source of a visual layer.
pub enum VisualFeed {
    /// Flat plane in the style's placeholder color.
    Placeholder,
    /// Pixels become a paint on the first drawn frame and are dropped on release.
    Still {
        pixels: StillPixels,
        paint: Option<vello_cpu::Image>,
        width: u32,
        height: u32,
    },
    Motion(MotionFeed),
}

pub enum StillPixels {
    Decoded(PreparedImage),
    File(StillFile),
}

impl StillPixels {
    fn materialize(&self) -> ReelResult<(vello_cpu::Image, u32, u32)> {
        let loaded;
        let img = match self {
            Self::Decoded(img) => img,
            Self::File(file) => {
                loaded = file.load()?;
                &loaded
            }
        };
        Ok((image_paint(img)?, img.width, img.height))
    }
}

/// Animation applied on top of the layout's resting placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisualAnimation {
    Static,
    KenBurns(KenBurns),
    Inset(MinimalistMotion),
}

/// Frame Compositor output for one scene: knows how to draw any of its frames onto the canvas.
pub struct VisualLayer {
    feed: VisualFeed,
    animation: VisualAnimation,
    layout: VisualLayout,
    placeholder: Rgba8Premul,
    frames: u64,
    fps: Fps,
    canvas: Canvas,
}

impl VisualLayer {
    /// Decide feed, layout and motion for a resolved scene.
    ///
    /// The chooser is consulted once, and only for full-bleed stills.
    pub fn plan(
        scene: &ResolvedScene,
        profile: &StyleProfile,
        canvas: Canvas,
        fps: Fps,
        frames: u64,
        chooser: &mut dyn MotionChooser,
    ) -> ReelResult<Self> {
        let feed = match &scene.visual {
            ResolvedVisual::Still(img) => VisualFeed::Still {
                pixels: StillPixels::Decoded(img.clone()),
                paint: None,
                width: img.width,
                height: img.height,
            },
            ResolvedVisual::StillFile(file) => VisualFeed::Still {
                pixels: StillPixels::File(file.clone()),
                paint: None,
                width: file.width,
                height: file.height,
            },
            ResolvedVisual::Motion(info) => {
                VisualFeed::Motion(MotionFeed::new(info.clone(), fps.frames_to_secs(frames)))
            }
            ResolvedVisual::Missing => VisualFeed::Placeholder,
        };

        let animation = match (&feed, profile.layout) {
            (VisualFeed::Placeholder, _) => VisualAnimation::Static,
            (VisualFeed::Still { .. }, VisualLayout::FullBleed) => {
                VisualAnimation::KenBurns(chooser.choose(scene.index))
            }
            (VisualFeed::Motion(_), VisualLayout::FullBleed) => VisualAnimation::Static,
            (_, VisualLayout::Inset { .. }) => VisualAnimation::Inset(MinimalistMotion::new(
                scene.record.motion_hint,
                profile.fade_sec,
            )),
        };
        tracing::debug!(
            index = scene.index,
            visual = scene.visual.kind_name(),
            ?animation,
            frames,
            "planned visual layer"
        );

        Ok(Self {
            feed,
            animation,
            layout: profile.layout,
            placeholder: profile.placeholder,
            frames: frames.max(1),
            fps,
            canvas,
        })
    }

    pub fn animation(&self) -> VisualAnimation {
        self.animation
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.feed, VisualFeed::Placeholder)
    }

    /// Whether source pixels are currently held in memory.
    pub fn is_materialized(&self) -> bool {
        match &self.feed {
            VisualFeed::Placeholder => false,
            VisualFeed::Still { paint, .. } => paint.is_some(),
            VisualFeed::Motion(feed) => feed.current.is_some(),
        }
    }

    /// Native size of the source, if there is one.
    pub fn source_size(&self) -> Option<(f64, f64)> {
        match &self.feed {
            VisualFeed::Placeholder => None,
            VisualFeed::Still { width, height, .. } => {
                Some((f64::from(*width), f64::from(*height)))
            }
            VisualFeed::Motion(feed) => Some(feed.size()),
        }
    }

    /// Source-to-canvas transform and opacity at `local_frame`.
    pub fn transform_at(&self, local_frame: u64) -> Option<(Affine, f32)> {
        let (w, h) = self.source_size()?;
        Some(self.placement(local_frame, (w, h)))
    }

    fn placement(&self, local_frame: u64, (w, h): (f64, f64)) -> (Affine, f32) {
        let canvas = self.canvas;
        let center = canvas_center(canvas);
        match self.layout {
            VisualLayout::FullBleed => {
                let base = cover_scale(w, h, canvas);
                let mut pose = match self.animation {
                    VisualAnimation::KenBurns(kb) => {
                        let progress = if self.frames > 1 {
                            local_frame as f64 / (self.frames - 1) as f64
                        } else {
                            0.0
                        };
                        kb.pose(progress, canvas)
                    }
                    _ => LayerPose::default(),
                };
                pose.offset = clamp_offset_to_cover(w, h, base * pose.scale, canvas, pose.offset);
                (layer_affine(w, h, base, center, &pose), pose.opacity)
            }
            VisualLayout::Inset {
                width_fraction,
                max_height_fraction,
                ..
            } => {
                let base = inset_scale(
                    w,
                    h,
                    f64::from(canvas.width) * width_fraction,
                    f64::from(canvas.height) * max_height_fraction,
                );
                let pose = match self.animation {
                    VisualAnimation::Inset(m) => m.pose(
                        self.fps.frames_to_secs(local_frame),
                        self.fps.frames_to_secs(self.frames),
                        canvas,
                    ),
                    _ => LayerPose::default(),
                };
                (layer_affine(w, h, base, center, &pose), pose.opacity)
            }
        }
    }

    /// Draw frame `local_frame` of this layer, replacing everything on the surface.
    pub fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        local_frame: u64,
        media: &mut dyn MediaBackend,
    ) -> ReelResult<()> {
        let canvas = self.canvas;
        let mut unusable_still = false;
        let source = match &mut self.feed {
            VisualFeed::Placeholder => None,
            VisualFeed::Still {
                pixels,
                paint,
                width,
                height,
            } => {
                if paint.is_none() {
                    match pixels.materialize() {
                        Ok((p, w, h)) => {
                            *paint = Some(p);
                            (*width, *height) = (w, h);
                        }
                        Err(e) => {
                            tracing::warn!(frame = local_frame, error = %e, "still could not be rasterized, using placeholder");
                            unusable_still = true;
                        }
                    }
                }
                paint
                    .clone()
                    .map(|p| (p, (f64::from(*width), f64::from(*height))))
            }
            VisualFeed::Motion(feed) => {
                let size = feed.size();
                feed.frame_at(local_frame, self.fps, media)
                    .cloned()
                    .map(|paint| (paint, size))
            }
        };
        if unusable_still {
            self.feed = VisualFeed::Placeholder;
        }
        let Some((paint, size)) = source else {
            fill_canvas(ctx, canvas, self.placeholder);
            return Ok(());
        };

        let background = match self.layout {
            VisualLayout::FullBleed => Rgba8Premul::opaque(0, 0, 0),
            VisualLayout::Inset { backdrop, .. } => backdrop,
        };
        fill_canvas(ctx, canvas, background);
        let (transform, opacity) = self.placement(local_frame, size);
        draw_image(ctx, &paint, size, transform, opacity);
        Ok(())
    }

    /// Close decoders and drop pixel data. Later draws show the placeholder.
    pub fn release(&mut self) {
        if let VisualFeed::Motion(feed) = &mut self.feed {
            feed.release();
        }
        self.feed = VisualFeed::Placeholder;
    }
}

/// Lazily opened motion clip stream, advanced one output frame at a time.
pub struct MotionFeed {
    info: VideoSourceInfo,
    duration_sec: f64,
    stream: Option<Box<dyn VideoFrameStream>>,
    /// Index of the frame the stream yields next.
    next_frame: u64,
    current: Option<vello_cpu::Image>,
    exhausted: bool,
    failed: bool,
}

impl MotionFeed {
    pub fn new(info: VideoSourceInfo, duration_sec: f64) -> Self {
        Self {
            info,
            duration_sec,
            stream: None,
            next_frame: 0,
            current: None,
            exhausted: false,
            failed: false,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (f64::from(self.info.width), f64::from(self.info.height))
    }

    /// Frame for `local_frame`. Holds the last good frame when the stream ends early.
    pub fn frame_at(
        &mut self,
        local_frame: u64,
        fps: Fps,
        media: &mut dyn MediaBackend,
    ) -> Option<&vello_cpu::Image> {
        if self.failed {
            return None;
        }
        if local_frame + 1 < self.next_frame {
            // Seeking backwards restarts from the clip's first frame.
            self.release();
        }
        if self.stream.is_none() && !self.exhausted {
            match media.open_video_stream(&self.info, fps, self.duration_sec) {
                Ok(stream) => {
                    self.stream = Some(stream);
                    self.next_frame = 0;
                }
                Err(e) => {
                    tracing::warn!(clip = %self.info.source_path.display(), error = %e, "motion clip failed to open, using placeholder");
                    self.failed = true;
                    return None;
                }
            }
        }
        while !self.exhausted && self.next_frame <= local_frame {
            let Some(stream) = self.stream.as_mut() else {
                break;
            };
            match stream.next_frame() {
                Ok(Some(rgba)) => {
                    self.next_frame += 1;
                    match prepare_rgba_frame(rgba, self.info.width, self.info.height)
                        .and_then(|img| image_paint(&img))
                    {
                        Ok(paint) => self.current = Some(paint),
                        Err(e) => {
                            tracing::warn!(clip = %self.info.source_path.display(), error = %e, "bad motion frame, holding previous");
                        }
                    }
                }
                Ok(None) => self.finish_stream(local_frame, None),
                Err(e) => self.finish_stream(local_frame, Some(e.to_string())),
            }
        }
        self.current.as_ref()
    }

    fn finish_stream(&mut self, local_frame: u64, error: Option<String>) {
        match error {
            Some(error) => tracing::warn!(
                clip = %self.info.source_path.display(),
                frame = local_frame,
                error,
                "motion clip read failed, holding last frame"
            ),
            None => tracing::debug!(
                clip = %self.info.source_path.display(),
                frame = local_frame,
                "motion clip ended early, holding last frame"
            ),
        }
        self.exhausted = true;
        self.stream = None;
    }

    /// Drop the decoder and cached frame.
    pub fn release(&mut self) {
        self.stream = None;
        self.current = None;
        self.next_frame = 0;
        self.exhausted = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/visual.rs"]
mod tests;
