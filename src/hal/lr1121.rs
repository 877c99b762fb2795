//! LR1121 SPI command driver.
//!
//! Every command is `opcode (u16 BE) + params`. The radio holds BUSY high
//! while it works; the host waits for BUSY low before each transfer. Read
//! commands return their data in a second transfer that starts with the
//! Stat1 byte.
//!
//! Reference: LR1121 user manual, "Host controller interface".

use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, InterruptType, Output, PinDriver};
use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriver};
use esp_idf_svc::sys::EspError;

use gps_lora_beacon::radio::{
    HalStatus, IrqMask, LoraModParams, LoraPktParams, PacketType, RadioHal, TcxoVoltage,
};
use gps_lora_beacon::TxDoneFlag;

mod opcodes {
    pub const GET_STATUS: u16 = 0x0100;
    pub const WRITE_BUFFER8: u16 = 0x0109;
    pub const GET_ERRORS: u16 = 0x010D;
    pub const CLEAR_ERRORS: u16 = 0x010E;
    pub const SET_DIO_IRQ_PARAMS: u16 = 0x0113;
    pub const CLEAR_IRQ: u16 = 0x0114;
    pub const SET_TCXO_MODE: u16 = 0x0117;
    pub const SET_TX: u16 = 0x020A;
    pub const SET_RF_FREQUENCY: u16 = 0x020B;
    pub const SET_PACKET_TYPE: u16 = 0x020E;
    pub const SET_MODULATION_PARAMS: u16 = 0x020F;
    pub const SET_PACKET_PARAMS: u16 = 0x0210;
}

/// SPI transfer failed.
pub const STATUS_SPI: HalStatus = HalStatus(-1);
/// BUSY stayed high past `BUSY_TIMEOUT_US`.
pub const STATUS_BUSY_TIMEOUT: HalStatus = HalStatus(-2);
/// Stat1 reported CMD_FAIL or CMD_PERR.
pub const STATUS_CMD_FAIL: HalStatus = HalStatus(-3);
/// IRQ line could not be armed.
pub const STATUS_IRQ_PIN: HalStatus = HalStatus(-4);

const BUSY_TIMEOUT_US: u32 = 100_000;
const BUSY_POLL_US: u32 = 10;
/// Opcode + WriteBuffer8 maximum payload.
const MAX_COMMAND_LEN: usize = 2 + 255;

/// Stat1 bits 3:1.
const CMD_STATUS_MASK: u8 = 0x0E;
const CMD_FAIL: u8 = 0x00;
const CMD_PERR: u8 = 0x02;

pub struct Lr1121<'d> {
    spi: SpiDeviceDriver<'d, SpiDriver<'d>>,
    busy: PinDriver<'d, AnyInputPin, Input>,
    irq: PinDriver<'d, AnyIOPin, Input>,
    _reset: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Lr1121<'d> {
    /// Hardware-reset the radio and arm the DIO9 interrupt.
    ///
    /// The interrupt handler only sets `tx_done`; it is one-shot and is
    /// re-armed by every `set_tx`.
    pub fn new(
        spi: SpiDeviceDriver<'d, SpiDriver<'d>>,
        busy: PinDriver<'d, AnyInputPin, Input>,
        mut irq: PinDriver<'d, AnyIOPin, Input>,
        mut reset: PinDriver<'d, AnyOutputPin, Output>,
        tx_done: &'static TxDoneFlag,
    ) -> Result<Self, EspError> {
        reset.set_low()?;
        FreeRtos::delay_ms(1);
        reset.set_high()?;
        FreeRtos::delay_ms(10);

        irq.set_interrupt_type(InterruptType::PosEdge)?;
        // SAFETY: the callback runs in ISR context and only stores an atomic.
        unsafe {
            irq.subscribe(move || tx_done.signal())?;
        }

        // BUSY stays high until boot completes; the first command waits it out.
        Ok(Self {
            spi,
            busy,
            irq,
            _reset: reset,
        })
    }

    fn wait_busy(&mut self) -> Result<(), HalStatus> {
        let mut waited = 0;
        while self.busy.is_high() {
            if waited >= BUSY_TIMEOUT_US {
                return Err(STATUS_BUSY_TIMEOUT);
            }
            Ets::delay_us(BUSY_POLL_US);
            waited += BUSY_POLL_US;
        }
        Ok(())
    }

    fn write_command(&mut self, opcode: u16, params: &[u8]) -> Result<(), HalStatus> {
        let len = 2 + params.len();
        if len > MAX_COMMAND_LEN {
            return Err(STATUS_CMD_FAIL);
        }
        let mut buf = [0u8; MAX_COMMAND_LEN];
        buf[..2].copy_from_slice(&opcode.to_be_bytes());
        buf[2..len].copy_from_slice(params);

        self.wait_busy()?;
        self.spi.write(&buf[..len]).map_err(|_| STATUS_SPI)?;
        Ok(())
    }

    /// Command followed by a response read. `response` excludes Stat1.
    fn read_command(&mut self, opcode: u16, params: &[u8], response: &mut [u8]) -> Result<(), HalStatus> {
        self.write_command(opcode, params)?;
        self.wait_busy()?;

        let mut buf = [0u8; 8];
        let len = 1 + response.len();
        self.spi.read(&mut buf[..len]).map_err(|_| STATUS_SPI)?;

        match buf[0] & CMD_STATUS_MASK {
            CMD_FAIL | CMD_PERR => return Err(STATUS_CMD_FAIL),
            _ => {}
        }
        response.copy_from_slice(&buf[1..len]);
        Ok(())
    }
}

impl RadioHal for Lr1121<'_> {
    fn set_tcxo_mode(&mut self, voltage: TcxoVoltage, timeout_steps: u32) -> Result<(), HalStatus> {
        let t = timeout_steps.to_be_bytes();
        self.write_command(opcodes::SET_TCXO_MODE, &[voltage as u8, t[1], t[2], t[3]])
    }

    fn clear_errors(&mut self) -> Result<(), HalStatus> {
        self.write_command(opcodes::CLEAR_ERRORS, &[])
    }

    fn get_errors(&mut self) -> Result<u16, HalStatus> {
        let mut rsp = [0u8; 2];
        self.read_command(opcodes::GET_ERRORS, &[], &mut rsp)?;
        Ok(u16::from_be_bytes(rsp))
    }

    fn set_packet_type(&mut self, packet_type: PacketType) -> Result<(), HalStatus> {
        self.write_command(opcodes::SET_PACKET_TYPE, &[packet_type as u8])
    }

    fn set_rf_frequency(&mut self, freq_hz: u32) -> Result<(), HalStatus> {
        self.write_command(opcodes::SET_RF_FREQUENCY, &freq_hz.to_be_bytes())
    }

    fn set_lora_mod_params(&mut self, params: &LoraModParams) -> Result<(), HalStatus> {
        self.write_command(
            opcodes::SET_MODULATION_PARAMS,
            &[params.sf as u8, params.bw as u8, params.cr as u8, params.ldro as u8],
        )
    }

    fn set_lora_pkt_params(&mut self, params: &LoraPktParams) -> Result<(), HalStatus> {
        let preamble = params.preamble_len_symb.to_be_bytes();
        self.write_command(
            opcodes::SET_PACKET_PARAMS,
            &[
                preamble[0],
                preamble[1],
                params.header_type as u8,
                params.payload_len,
                params.crc as u8,
                params.iq as u8,
            ],
        )
    }

    fn write_buffer(&mut self, data: &[u8]) -> Result<(), HalStatus> {
        self.write_command(opcodes::WRITE_BUFFER8, data)
    }

    fn set_tx(&mut self, timeout_steps: u32) -> Result<(), HalStatus> {
        self.irq.enable_interrupt().map_err(|_| STATUS_IRQ_PIN)?;
        let t = timeout_steps.to_be_bytes();
        self.write_command(opcodes::SET_TX, &[t[1], t[2], t[3]])
    }

    fn get_irq_status(&mut self) -> Result<IrqMask, HalStatus> {
        // GetStatus: Stat1 | Stat2 | IrqStatus (u32 BE)
        let mut rsp = [0u8; 5];
        self.read_command(opcodes::GET_STATUS, &[], &mut rsp)?;
        Ok(IrqMask(u32::from_be_bytes([rsp[1], rsp[2], rsp[3], rsp[4]])))
    }

    fn clear_irq_status(&mut self, mask: IrqMask) -> Result<(), HalStatus> {
        self.write_command(opcodes::CLEAR_IRQ, &mask.bits().to_be_bytes())
    }

    fn set_dio_irq_params(&mut self, irq1: IrqMask, irq2: IrqMask) -> Result<(), HalStatus> {
        let a = irq1.bits().to_be_bytes();
        let b = irq2.bits().to_be_bytes();
        self.write_command(
            opcodes::SET_DIO_IRQ_PARAMS,
            &[a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]],
        )
    }
}
