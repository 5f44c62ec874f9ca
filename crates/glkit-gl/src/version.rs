//! GL version string parsing.

use glkit_core::ContextVersion;

/// API family named by a `GL_VERSION` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlApi {
    Desktop,
    Es,
    WebGl,
}

/// Parsed `GL_VERSION` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVersion {
    pub api: GlApi,
    pub major: u32,
    pub minor: u32,
}

impl GlVersion {
    /// Parse a `GL_VERSION` string such as `"4.6.0 NVIDIA 535.54"`,
    /// `"OpenGL ES 3.2 Mesa 23.0"` or `"WebGL 2.0"`.
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim();
        let (api, rest) = if let Some(rest) = version.strip_prefix("OpenGL ES") {
            // "OpenGL ES-CM 1.1" and friends carry a profile suffix.
            (GlApi::Es, rest.trim_start_matches(|c: char| c != ' '))
        } else if let Some(rest) = version.strip_prefix("WebGL") {
            (GlApi::WebGl, rest)
        } else {
            (GlApi::Desktop, version)
        };

        let number = rest.split_whitespace().next()?;
        let mut parts = number.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        Some(Self { api, major, minor })
    }

    /// Map onto the two API generations the core distinguishes.
    ///
    /// ES 3, WebGL 2 and desktop GL 3+ have core vertex array objects.
    pub fn context_version(self) -> ContextVersion {
        let v2 = match self.api {
            GlApi::Desktop | GlApi::Es => self.major >= 3,
            GlApi::WebGl => self.major >= 2,
        };
        if v2 {
            ContextVersion::V2
        } else {
            ContextVersion::V1
        }
    }
}

/// Detect the context generation from a `GL_VERSION` string.
pub fn detect_version(version: &str) -> Option<ContextVersion> {
    GlVersion::parse(version).map(GlVersion::context_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktop_versions() {
        assert_eq!(
            GlVersion::parse("4.6.0 NVIDIA 535.54.03"),
            Some(GlVersion { api: GlApi::Desktop, major: 4, minor: 6 })
        );
        assert_eq!(detect_version("3.3 (Core Profile) Mesa 23.1"), Some(ContextVersion::V2));
        assert_eq!(detect_version("2.1 Metal - 83.1"), Some(ContextVersion::V1));
    }

    #[test]
    fn parses_es_versions() {
        assert_eq!(detect_version("OpenGL ES 3.2 Mesa 23.0.4"), Some(ContextVersion::V2));
        assert_eq!(detect_version("OpenGL ES 2.0 (ANGLE 2.1)"), Some(ContextVersion::V1));
        assert_eq!(detect_version("WebGL 2.0"), Some(ContextVersion::V2));
        assert_eq!(detect_version("WebGL 1.0 (OpenGL ES 2.0 Chromium)"), Some(ContextVersion::V1));
        assert_eq!(
            GlVersion::parse("OpenGL ES-CM 1.1"),
            Some(GlVersion { api: GlApi::Es, major: 1, minor: 1 })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(detect_version(""), None);
        assert_eq!(detect_version("OpenGL ES"), None);
        assert_eq!(detect_version("vendor blob"), None);
    }
}
