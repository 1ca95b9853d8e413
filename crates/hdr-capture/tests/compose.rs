use std::sync::mpsc::channel;

use hdr_capture::{
    Canvas, CapturedFrame, DeviceLock, Display, DisplayError, DisplayId, DisplayRect,
    FailurePolicy, PixelFormat, PlaceError,
    compose::{Composer, DisplayResult},
    union_rect,
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

fn display(id: isize, left: i32, top: i32, right: i32, bottom: i32) -> Display {
    Display {
        id: DisplayId(id),
        name: format!("DISPLAY{id}"),
        rect: DisplayRect::new(left, top, right, bottom).unwrap(),
        hdr: None,
    }
}

fn random_frame(rng: &mut StdRng, size: [u32; 2]) -> CapturedFrame {
    let mut data = vec![0u8; size[0] as usize * size[1] as usize * 4];
    rng.fill(data.as_mut_slice());
    CapturedFrame::new(PixelFormat::Bgra8Unorm, size[0], size[1], data).unwrap()
}

#[test]
fn single_display_canvas() {
    let displays = [display(1, 0, 0, 1920, 1080)];
    let canvas = Canvas::new(union_rect(&displays).unwrap());

    assert_eq!(canvas.width(), 1920);
    assert_eq!(canvas.height(), 1080);
    assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(canvas.pixel(1919, 1079), Some([0, 0, 0, 255]));
    assert_eq!(canvas.pixel(1920, 0), None);
}

#[test]
fn empty_display_set_has_no_union() {
    assert_eq!(union_rect(&[]), None);
}

#[test]
fn canvas_covers_offset_and_negative_displays() {
    let displays = [
        display(1, 0, 0, 2560, 1440),
        display(2, -1920, 300, 0, 1380),
        display(3, 2560, -1080, 4480, 0),
    ];
    let union = union_rect(&displays).unwrap();

    assert_eq!(union, DisplayRect::new(-1920, -1080, 4480, 1440).unwrap());
    assert_eq!(union.size(), [6400, 2520]);
}

#[test]
fn second_display_placed_at_offset() {
    let displays = [display(1, 0, 0, 1920, 1080), display(2, 1920, 0, 3840, 1080)];
    let mut canvas = Canvas::new(union_rect(&displays).unwrap());
    assert_eq!(canvas.width(), 3840);

    let white = CapturedFrame::filled(PixelFormat::Bgra8Unorm, 1920, 1080, &[255; 4]).unwrap();
    canvas.place(&displays[1].rect, &white).unwrap();

    assert_eq!(canvas.offset_of(&displays[1].rect).unwrap(), [1920, 0]);
    assert_eq!(canvas.pixel(1919, 0), Some([0, 0, 0, 255]));
    assert_eq!(canvas.pixel(1920, 0), Some([255; 4]));
    assert_eq!(canvas.pixel(3839, 1079), Some([255; 4]));
}

#[test]
fn place_rejects_invalid_frames() {
    let displays = [display(1, 0, 0, 64, 32)];
    let mut canvas = Canvas::new(union_rect(&displays).unwrap());

    let hdr = CapturedFrame::filled(PixelFormat::Rgba16Float, 64, 32, &[0; 8]).unwrap();
    assert!(matches!(
        canvas.place(&displays[0].rect, &hdr),
        Err(PlaceError::Format(PixelFormat::Rgba16Float))
    ));

    let small = CapturedFrame::filled(PixelFormat::Bgra8Unorm, 32, 32, &[1; 4]).unwrap();
    assert!(matches!(
        canvas.place(&displays[0].rect, &small),
        Err(PlaceError::Size { .. })
    ));

    let outside = DisplayRect::new(32, 0, 96, 32).unwrap();
    let frame = CapturedFrame::filled(PixelFormat::Bgra8Unorm, 64, 32, &[1; 4]).unwrap();
    assert!(matches!(
        canvas.place(&outside, &frame),
        Err(PlaceError::OutOfBounds { .. })
    ));
}

#[test]
fn placement_order_does_not_change_canvas() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let displays = [
        display(1, 0, 0, 160, 90),
        display(2, 160, 0, 320, 90),
        display(3, -128, 90, 32, 180),
        display(4, 32, 90, 96, 126),
    ];
    let frames: Vec<CapturedFrame> = displays
        .iter()
        .map(|display| random_frame(&mut rng, display.rect.size()))
        .collect();
    let bounds = union_rect(&displays).unwrap();

    let mut expected = Canvas::new(bounds);
    for (display, frame) in displays.iter().zip(&frames) {
        expected.place(&display.rect, frame).unwrap();
    }

    for _ in 0..8 {
        let mut order: Vec<usize> = (0..displays.len()).collect();
        order.shuffle(&mut rng);

        let mut canvas = Canvas::new(bounds);
        for index in order {
            canvas.place(&displays[index].rect, &frames[index]).unwrap();
        }

        assert_eq!(canvas.data(), expected.data());
    }
}

#[test]
fn composer_accepts_any_completion_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let displays = [
        display(1, 0, 0, 64, 64),
        display(2, 64, 0, 128, 64),
        display(3, 0, 64, 128, 96),
    ];
    let frames: Vec<CapturedFrame> = displays
        .iter()
        .map(|display| random_frame(&mut rng, display.rect.size()))
        .collect();
    let bounds = union_rect(&displays).unwrap();

    let compose_in = |order: &[usize]| {
        let (sender, receiver) = channel::<DisplayResult>();
        for &index in order {
            sender.send((index, Ok(frames[index].clone()))).unwrap();
        }
        drop(sender);

        let mut canvas = Canvas::new(bounds);
        let composer = Composer::new(&displays, FailurePolicy::Abort, DeviceLock::new());
        let filled = composer.compose(&mut canvas, receiver).unwrap();
        assert!(filled.is_empty());
        canvas
    };

    let forward = compose_in(&[0, 1, 2]);
    let reverse = compose_in(&[2, 1, 0]);
    let interleaved = compose_in(&[1, 2, 0]);

    assert_eq!(forward.data(), reverse.data());
    assert_eq!(forward.data(), interleaved.data());
}

#[test]
fn composer_aborts_on_failure() {
    let displays = [display(1, 0, 0, 16, 16), display(2, 16, 0, 32, 16)];
    let (sender, receiver) = channel::<DisplayResult>();
    let frame = CapturedFrame::filled(PixelFormat::Bgra8Unorm, 16, 16, &[9; 4]).unwrap();
    sender.send((0, Ok(frame))).unwrap();
    sender.send((1, Err(DisplayError::Disconnected))).unwrap();
    drop(sender);

    let mut canvas = Canvas::new(union_rect(&displays).unwrap());
    let composer = Composer::new(&displays, FailurePolicy::Abort, DeviceLock::new());
    let error = composer.compose(&mut canvas, receiver).unwrap_err();

    assert_eq!(error.display, "DISPLAY2");
}

#[test]
fn composer_fills_missing_results() {
    let displays = [display(1, 0, 0, 16, 16), display(2, 16, 0, 32, 16)];
    let (sender, receiver) = channel::<DisplayResult>();
    let frame = CapturedFrame::filled(PixelFormat::Bgra8Unorm, 16, 16, &[9; 4]).unwrap();
    sender.send((0, Ok(frame))).unwrap();
    drop(sender);

    let mut canvas = Canvas::new(union_rect(&displays).unwrap());
    let composer = Composer::new(&displays, FailurePolicy::FillBackground, DeviceLock::new());
    let filled = composer.compose(&mut canvas, receiver).unwrap();

    assert_eq!(filled, vec!["DISPLAY2".to_string()]);
    assert_eq!(canvas.pixel(0, 0), Some([9; 4]));
    assert_eq!(canvas.pixel(16, 0), Some([0, 0, 0, 255]));
}
