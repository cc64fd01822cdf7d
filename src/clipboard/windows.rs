use std::process::ExitStatus;

use super::backend::{Backend, Negotiation};
use crate::models::ImageFormat;

/// Windows has a single OS-integrated provider
pub const CHAIN: &[Backend] = &[Backend::PowerShell];

pub const INSTALL_HINT: &str =
    "Windows PowerShell is required to read images from the clipboard.";

/// Exit code the fetch script uses when the clipboard image object is null
const NULL_IMAGE_EXIT_CODE: i32 = 2;

const CONTAINS_IMAGE_SCRIPT: &str = "Add-Type -AssemblyName System.Windows.Forms; \
     [System.Windows.Forms.Clipboard]::ContainsImage()";

// The clipboard image is re-encoded as PNG by System.Drawing and streamed raw to stdout
const FETCH_PNG_SCRIPT: &str = "$ErrorActionPreference = 'Stop'; \
     Add-Type -AssemblyName System.Windows.Forms; \
     Add-Type -AssemblyName System.Drawing; \
     $img = [System.Windows.Forms.Clipboard]::GetImage(); \
     if ($img -eq $null) { exit 2 }; \
     $ms = New-Object System.IO.MemoryStream; \
     $img.Save($ms, [System.Drawing.Imaging.ImageFormat]::Png); \
     $out = [Console]::OpenStandardOutput(); \
     $out.Write($ms.ToArray(), 0, [int]$ms.Length); \
     $out.Flush()";

fn powershell_args(script: &'static str) -> Vec<&'static str> {
    vec!["-NoProfile", "-NonInteractive", "-STA", "-Command", script]
}

pub(super) fn contains_image_args() -> Vec<&'static str> {
    powershell_args(CONTAINS_IMAGE_SCRIPT)
}

pub(super) fn fetch_png_args() -> Vec<&'static str> {
    powershell_args(FETCH_PNG_SCRIPT)
}

/// PowerShell cannot tell encodings apart, so a present image is assumed to be PNG
pub(super) fn parse_contains_image(stdout: &[u8]) -> Negotiation {
    let answer = String::from_utf8_lossy(stdout);
    if answer.trim().eq_ignore_ascii_case("true") {
        Negotiation::Format(ImageFormat::Png)
    } else {
        Negotiation::NoImage
    }
}

pub(super) fn is_null_image(status: ExitStatus) -> bool {
    status.code() == Some(NULL_IMAGE_EXIT_CODE)
}
