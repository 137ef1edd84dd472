pub mod canvas {

    /// Edge length of the normalized square canvas.
    pub const SIZE: u32 = 640;

    pub const BACKGROUND: [u8; 3] = [255, 255, 255];
}

pub mod annotation {

    pub const STROKE_COLOR: [u8; 4] = [255, 255, 0, 255];

    pub const LABEL_PROMPT: &str = "Type here the correct option";

    pub const DEFAULT_SELECTOR: &str = "xywh=pixel:273,171,123,94";

    pub const ANNO_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";

    pub const MEDIA_FRAGMENTS_SPEC: &str = "http://www.w3.org/TR/media-frags/";
}

pub mod limits {

    pub const DASHBOARD_PAGE_SIZE: u64 = 10;
}

pub mod export {

    pub const ARCHIVE_NAME: &str = "images.zip";
}

pub mod session {

    pub const USER_ID_KEY: &str = "user_id";

    pub const FLASH_KEY: &str = "_flashes";
}
