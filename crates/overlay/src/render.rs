//! GDI painting for the overlay and the controls panel

use crate::controls::{ControlButton, ControlsPanel};
use crate::scene::{Color, DrawCommand, Scene, SceneRect};
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreateFontW, CreatePen,
    CreateSolidBrush, DeleteDC, DeleteObject, DrawTextW, EndPaint, FillRect, GetStockObject,
    Rectangle, SelectObject, SetBkMode, SetTextColor, CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET,
    DEFAULT_PITCH, DEFAULT_QUALITY, DT_CENTER, DT_SINGLELINE, DT_VCENTER, FF_SWISS, FW_NORMAL,
    FW_SEMIBOLD, HDC, NULL_BRUSH, OUT_DEFAULT_PRECIS, PAINTSTRUCT, PS_INSIDEFRAME, SRCCOPY,
    TRANSPARENT,
};
use windows::Win32::UI::WindowsAndMessaging::GetClientRect;

const PANEL_BACKGROUND: Color = Color::rgb(0x20, 0x20, 0x20);
const GRIP_DOTS: Color = Color::rgb(0x80, 0x80, 0x80);
const BUTTON_FACE: Color = Color::rgb(0x3a, 0x3a, 0x3a);
const BUTTON_PRESSED: Color = Color::rgb(0x55, 0x55, 0x55);
const BUTTON_DISABLED: Color = Color::rgb(0x2a, 0x2a, 0x2a);
const STOP_FACE: Color = Color::rgb(0xc0, 0x20, 0x20);
const TEXT_DISABLED: Color = Color::rgb(0x70, 0x70, 0x70);
const PANEL_TEXT_SIZE: i32 = 16;

fn colorref(color: Color) -> COLORREF {
    COLORREF(color.to_colorref())
}

fn to_rect(r: SceneRect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

/// WM_PAINT handler for the overlay window
pub unsafe fn paint_scene(hwnd: HWND, scene: &Scene) {
    paint_buffered(hwnd, |hdc, client| {
        for command in scene.commands() {
            draw_command(hdc, client, command);
        }
    });
}

/// WM_PAINT handler for the panel window
pub unsafe fn paint_panel(hwnd: HWND, panel: &ControlsPanel) {
    paint_buffered(hwnd, |hdc, client| {
        fill(hdc, client, PANEL_BACKGROUND);
        draw_grip(hdc, to_rect(ControlsPanel::grip_rect()));

        for button in ControlButton::ALL {
            let rect = to_rect(ControlsPanel::button_rect(button));
            let face = if !panel.is_enabled(button) {
                BUTTON_DISABLED
            } else if panel.is_pressed(button) {
                BUTTON_PRESSED
            } else if button == ControlButton::Record && panel.is_recording() {
                STOP_FACE
            } else {
                BUTTON_FACE
            };
            let text = if panel.is_enabled(button) {
                Color::WHITE
            } else {
                TEXT_DISABLED
            };

            fill(hdc, rect, face);
            draw_text(hdc, rect, panel.label(button), text, PANEL_TEXT_SIZE, false);
        }
    });
}

/// Paint into an off-screen bitmap and blit once to avoid flicker.
unsafe fn paint_buffered(hwnd: HWND, draw: impl FnOnce(HDC, RECT)) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);

    let mut client = RECT::default();
    let _ = GetClientRect(hwnd, &mut client);
    let width = client.right - client.left;
    let height = client.bottom - client.top;

    let mem = CreateCompatibleDC(hdc);
    let bitmap = CreateCompatibleBitmap(hdc, width, height);
    let old_bitmap = SelectObject(mem, bitmap);

    draw(mem, client);
    let _ = BitBlt(hdc, 0, 0, width, height, mem, 0, 0, SRCCOPY);

    SelectObject(mem, old_bitmap);
    let _ = DeleteObject(bitmap);
    let _ = DeleteDC(mem);
    let _ = EndPaint(hwnd, &ps);
}

unsafe fn draw_command(hdc: HDC, client: RECT, command: &DrawCommand) {
    match command {
        DrawCommand::FillScreen(color) => fill(hdc, client, *color),
        DrawCommand::FillRect { rect, color } => fill(hdc, to_rect(*rect), *color),
        DrawCommand::StrokeRect { rect, color, width } => stroke(hdc, to_rect(*rect), *color, *width),
        DrawCommand::Text {
            text,
            x,
            y,
            color,
            size,
        } => {
            let span = client.right - client.left;
            let rect = RECT {
                left: x - span,
                top: y - size,
                right: x + span,
                bottom: y + size,
            };
            draw_text(hdc, rect, text, *color, *size, true);
        }
    }
}

unsafe fn fill(hdc: HDC, rect: RECT, color: Color) {
    let brush = CreateSolidBrush(colorref(color));
    FillRect(hdc, &rect, brush);
    let _ = DeleteObject(brush);
}

unsafe fn stroke(hdc: HDC, rect: RECT, color: Color, width: i32) {
    let pen = CreatePen(PS_INSIDEFRAME, width, colorref(color));
    let old_pen = SelectObject(hdc, pen);
    let old_brush = SelectObject(hdc, GetStockObject(NULL_BRUSH));

    let _ = Rectangle(hdc, rect.left, rect.top, rect.right, rect.bottom);

    SelectObject(hdc, old_brush);
    SelectObject(hdc, old_pen);
    let _ = DeleteObject(pen);
}

unsafe fn draw_grip(hdc: HDC, rect: RECT) {
    let cx = (rect.left + rect.right) / 2;
    let mut y = rect.top + 4;
    while y + 2 <= rect.bottom - 2 {
        for x in [cx - 3, cx + 2] {
            fill(
                hdc,
                RECT {
                    left: x,
                    top: y,
                    right: x + 2,
                    bottom: y + 2,
                },
                GRIP_DOTS,
            );
        }
        y += 5;
    }
}

unsafe fn draw_text(hdc: HDC, mut rect: RECT, text: &str, color: Color, size: i32, bold: bool) {
    let weight = if bold { FW_SEMIBOLD } else { FW_NORMAL };
    let font = CreateFontW(
        size,
        0,
        0,
        0,
        weight.0 as i32,
        0,
        0,
        0,
        DEFAULT_CHARSET.0 as u32,
        OUT_DEFAULT_PRECIS.0 as u32,
        CLIP_DEFAULT_PRECIS.0 as u32,
        DEFAULT_QUALITY.0 as u32,
        (DEFAULT_PITCH.0 | FF_SWISS.0) as u32,
        w!("Segoe UI"),
    );
    let old_font = SelectObject(hdc, font);

    SetBkMode(hdc, TRANSPARENT);
    SetTextColor(hdc, colorref(color));

    let mut wide: Vec<u16> = text.encode_utf16().collect();
    DrawTextW(hdc, &mut wide, &mut rect, DT_CENTER | DT_VCENTER | DT_SINGLELINE);

    SelectObject(hdc, old_font);
    let _ = DeleteObject(font);
}
