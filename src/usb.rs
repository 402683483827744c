//! USB CDC-ACM debug console.

use blackbox::sensors::DebugSink;
use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(pub struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial<'a> = CdcAcmClass<'a, UsbDriver>;

const MAX_PACKET: usize = 64;
/// A host that holds DTR but stops reading never drains the IN endpoint.
const PACKET_TIMEOUT: Duration = Duration::from_millis(5);

struct UsbBuffers {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    ep_out: [u8; 256],
}

static BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Call once at startup.
pub fn init(
    usb_periph: peripherals::USB_OTG_FS,
    pa12: peripherals::PA12,
    pa11: peripherals::PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial<'static>) {
    let buffers = BUFFERS.init(UsbBuffers {
        config_desc: [0; 256],
        bos_desc: [0; 256],
        control_buf: [0; 64],
        ep_out: [0; 256],
    });

    let mut usb_config = usb_otg::Config::default();
    usb_config.vbus_detection = false;
    let driver = Driver::new_fs(usb_periph, Irqs, pa12, pa11, &mut buffers.ep_out, usb_config);

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("AERO21412");
    config.product = Some("Thrust/Torque Black Box");
    config.serial_number = Some("BB000001");

    let mut builder = Builder::new(
        driver,
        config,
        &mut buffers.config_desc,
        &mut buffers.bos_desc,
        &mut [], // no MS OS descriptors
        &mut buffers.control_buf,
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET as u16);

    (builder.build(), class)
}

/// Line-oriented writer over the CDC class. Drops output while no terminal
/// holds DTR.
pub struct UsbConsole {
    serial: UsbSerial<'static>,
}

impl UsbConsole {
    pub fn new(serial: UsbSerial<'static>) -> Self {
        Self { serial }
    }

    #[allow(dead_code)]
    pub fn connected(&self) -> bool {
        self.serial.dtr()
    }
}

impl UsbConsole {
    /// One packet, or `false` if the endpoint errored or stayed full.
    async fn send(&mut self, packet: &[u8]) -> bool {
        matches!(
            with_timeout(PACKET_TIMEOUT, self.serial.write_packet(packet)).await,
            Ok(Ok(()))
        )
    }
}

impl DebugSink for UsbConsole {
    async fn write_line(&mut self, line: &str) {
        if !self.serial.dtr() {
            return;
        }
        for chunk in line.as_bytes().chunks(MAX_PACKET) {
            if !self.send(chunk).await {
                return;
            }
        }
        self.send(b"\r\n").await;
    }
}
