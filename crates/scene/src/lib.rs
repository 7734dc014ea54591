pub mod component;
pub mod loader;
pub mod object;
pub mod writer;

pub use component::{
	Audio2DComponent, CameraComponent, CodeComponent, CollBodyComponent, CollMeshComponent,
	Component, ComponentKind, LightComponent, ModelComponent,
};
pub use loader::{load_scene, LoadedObject, LoadedScene, SceneLoadError};
pub use object::{Object, ObjectId, Scene};
pub use writer::{build_scene, SceneFiles};
