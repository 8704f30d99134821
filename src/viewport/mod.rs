//! On-screen viewports and off-screen surfaces

pub mod raster;
pub mod registry;
pub mod surface;

pub use raster::{RasterSurface, RasterSurfaceFactory};
pub use registry::ViewportRegistry;
pub use surface::{DisplaySize, RenderSurface, SurfaceDescriptor, SurfaceError, SurfaceFactory};
