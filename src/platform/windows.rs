use std::ffi::c_void;
use std::path::Path;

use image::RgbaImage;
use windows::core::HSTRING;
use windows::Win32::Foundation::{HANDLE, HWND};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, SelectObject, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBRUSH, HDC,
};
use windows::Win32::UI::Shell::ExtractIconExW;
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyIcon, DrawIconEx, GetForegroundWindow, GetSystemMetrics, GetWindowThreadProcessId,
    DI_NORMAL, HICON, SM_CXICON,
};

use super::DesktopShell;
use crate::icons::IconError;

pub struct WindowsShell;

impl WindowsShell {
    pub fn new() -> Self {
        Self
    }
}

impl DesktopShell for WindowsShell {
    fn foreground_pid(&self) -> Option<u32> {
        unsafe {
            let hwnd: HWND = GetForegroundWindow();
            if hwnd.0 == 0 {
                return None;
            }
            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
            (pid != 0).then_some(pid)
        }
    }

    fn icon_metric(&self) -> u32 {
        let size = unsafe { GetSystemMetrics(SM_CXICON) };
        if size > 0 {
            size as u32
        } else {
            32
        }
    }

    fn extract_icon(&self, exe: &Path) -> Result<RgbaImage, IconError> {
        let path = HSTRING::from(exe.as_os_str());
        let mut large = HICON::default();

        let count = unsafe { ExtractIconExW(&path, 0, Some(&mut large as *mut HICON), None, 1) };
        if count == 0 || large.is_invalid() {
            return Err(IconError::Extraction(format!(
                "no icon resource in {}",
                exe.display()
            )));
        }

        let size = self.icon_metric();
        let result = unsafe { render_icon(large, size) };
        unsafe {
            let _ = DestroyIcon(large);
        }
        result
    }
}

/// Draw `icon` into a 32-bit top-down DIB and copy it out as RGBA
unsafe fn render_icon(icon: HICON, size: u32) -> Result<RgbaImage, IconError> {
    let dc = CreateCompatibleDC(HDC::default());
    if dc.is_invalid() {
        return Err(IconError::Extraction("CreateCompatibleDC failed".into()));
    }

    let bmi = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: size as i32,
            biHeight: -(size as i32),
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut bits: *mut c_void = std::ptr::null_mut();
    let bitmap = match CreateDIBSection(dc, &bmi, DIB_RGB_COLORS, &mut bits, HANDLE::default(), 0)
    {
        Ok(bitmap) if !bits.is_null() => bitmap,
        _ => {
            let _ = DeleteDC(dc);
            return Err(IconError::Extraction("CreateDIBSection failed".into()));
        }
    };

    let previous = SelectObject(dc, bitmap);
    let drawn = DrawIconEx(dc, 0, 0, icon, size as i32, size as i32, 0, HBRUSH::default(), DI_NORMAL);

    let len = (size * size * 4) as usize;
    let bgra = std::slice::from_raw_parts(bits as *const u8, len).to_vec();

    SelectObject(dc, previous);
    let _ = DeleteObject(bitmap);
    let _ = DeleteDC(dc);

    drawn.map_err(|e| IconError::Extraction(format!("DrawIconEx failed: {}", e)))?;

    let mut rgba = bgra;
    for px in rgba.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    RgbaImage::from_raw(size, size, rgba)
        .ok_or_else(|| IconError::Extraction("icon buffer size mismatch".into()))
}
