//! In-memory [`WindowSystem`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::errors::DisplayError;
use super::traits::WindowSystem;
use super::types::{
    LocalGeometry, MapState, Screen, ScreenId, TitleProperty, TreeNode, WindowAttributes,
    WindowId,
};

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub parent: Option<WindowId>,
    pub children: Vec<WindowId>,
    pub geometry: LocalGeometry,
    pub map_state: MapState,
    pub net_wm_name: Option<Vec<u8>>,
    pub wm_name: Option<Vec<u8>>,
}

/// A single-screen display whose tree is built up with [`FakeDisplay::add`].
#[derive(Debug)]
pub struct FakeDisplay {
    name: String,
    root: WindowId,
    windows: Mutex<HashMap<WindowId, FakeWindow>>,
    /// Windows that disappear when queried, simulating destruction mid-walk.
    gone: Mutex<Vec<WindowId>>,
}

impl FakeDisplay {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        let root = WindowId(1);
        let mut windows = HashMap::new();
        windows.insert(
            root,
            FakeWindow {
                parent: None,
                children: Vec::new(),
                geometry: LocalGeometry {
                    x: 0,
                    y: 0,
                    width,
                    height,
                },
                map_state: MapState::Viewable,
                net_wm_name: None,
                wm_name: None,
            },
        );
        Self {
            name: name.to_string(),
            root,
            windows: Mutex::new(windows),
            gone: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> WindowId {
        self.root
    }

    pub fn screen(&self) -> Screen {
        self.screens().remove(0)
    }

    /// Add a viewable window titled via `_NET_WM_NAME`.
    pub fn add(
        &self,
        id: u32,
        parent: WindowId,
        (x, y, width, height): (i32, i32, u32, u32),
        title: Option<&str>,
    ) -> WindowId {
        self.add_with(id, parent, (x, y, width, height), |w| {
            w.net_wm_name = title.map(|t| t.as_bytes().to_vec());
        })
    }

    pub fn add_with(
        &self,
        id: u32,
        parent: WindowId,
        (x, y, width, height): (i32, i32, u32, u32),
        configure: impl FnOnce(&mut FakeWindow),
    ) -> WindowId {
        let id = WindowId(id);
        let mut window = FakeWindow {
            parent: Some(parent),
            children: Vec::new(),
            geometry: LocalGeometry {
                x,
                y,
                width,
                height,
            },
            map_state: MapState::Viewable,
            net_wm_name: None,
            wm_name: None,
        };
        configure(&mut window);

        let mut windows = self.windows.lock().unwrap();
        windows
            .get_mut(&parent)
            .expect("parent must be added first")
            .children
            .push(id);
        windows.insert(id, window);
        id
    }

    pub fn destroy(&self, id: WindowId) {
        self.gone.lock().unwrap().push(id);
    }

    fn with_window<T>(
        &self,
        id: WindowId,
        f: impl FnOnce(&FakeWindow) -> T,
    ) -> Result<T, DisplayError> {
        if self.gone.lock().unwrap().contains(&id) {
            return Err(DisplayError::WindowGone { id });
        }
        self.windows
            .lock()
            .unwrap()
            .get(&id)
            .map(f)
            .ok_or(DisplayError::WindowGone { id })
    }
}

impl WindowSystem for FakeDisplay {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn screens(&self) -> Vec<Screen> {
        let root = self.windows.lock().unwrap()[&self.root].geometry;
        vec![Screen {
            id: ScreenId::new(&self.name, 0),
            root: self.root,
            width: root.width,
            height: root.height,
        }]
    }

    fn query_tree(&self, window: WindowId) -> Result<TreeNode, DisplayError> {
        self.with_window(window, |w| TreeNode {
            parent: w.parent,
            children: w.children.clone(),
        })
    }

    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, DisplayError> {
        self.with_window(window, |w| WindowAttributes {
            map_state: w.map_state,
        })
    }

    fn local_geometry(&self, window: WindowId) -> Result<LocalGeometry, DisplayError> {
        self.with_window(window, |w| w.geometry)
    }

    fn title_property(
        &self,
        window: WindowId,
        property: TitleProperty,
    ) -> Result<Option<Vec<u8>>, DisplayError> {
        self.with_window(window, |w| match property {
            TitleProperty::NetWmName => w.net_wm_name.clone(),
            TitleProperty::WmName => w.wm_name.clone(),
        })
    }
}
