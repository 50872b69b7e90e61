//! Usage table: `(usage page, usage id)` → semantic name and control type.
//!
//! The table is static, ordered data. [`find_usage_definition`] scans it for the
//! first entry whose page matches and whose inclusive `[min, max]` range holds
//! the usage id, so specific entries must precede the catch-all `RESERVED`
//! ranges of the same page.
//!
//! Lookups never fail: vendor pages, reserved pages and unknown usages resolve
//! to synthetic definitions.
//!
//! Names and control types follow the HID Usage Tables 1.3 document.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Usage control types (HUT section 3.4).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UsageControlFlags: u16 {
        /// LC
        const LINEAR_CONTROL = 1;
        /// OOC (toggle)
        const ON_OFF_CONTROL = 1 << 1;
        /// MC
        const MOMENTARY_CONTROL = 1 << 2;
        /// OSC
        const ONE_SHOT_CONTROL = 1 << 3;
        /// RTC
        const RETRIGGER_CONTROL = 1 << 4;
        /// Sel
        const SELECTOR = 1 << 5;
        /// SV
        const STATIC_VALUE = 1 << 6;
        /// SF
        const STATIC_FLAG = 1 << 7;
        /// DV
        const DYNAMIC_VALUE = 1 << 8;
        /// DF
        const DYNAMIC_FLAG = 1 << 9;
        /// NAry
        const NAMED_ARRAY = 1 << 10;
        /// CA
        const APPLICATION_COLLECTION = 1 << 11;
        /// CL
        const LOGICAL_COLLECTION = 1 << 12;
        /// CP
        const PHYSICAL_COLLECTION = 1 << 13;
        /// US
        const USAGE_SWITCH = 1 << 14;
        /// UM
        const USAGE_MODIFIER = 1 << 15;
    }
}

/// One range of the usage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDef {
    pub page: u16,
    pub min: u16,
    pub max: u16,
    pub control_type: UsageControlFlags,
    pub name: &'static str,
}

impl UsageDef {
    const fn new(page: u16, min: u16, max: u16, control_type: UsageControlFlags, name: &'static str) -> Self {
        Self {
            page,
            min,
            max,
            control_type,
            name,
        }
    }

    #[inline]
    pub fn contains(&self, usage_id: u16) -> bool {
        usage_id >= self.min && usage_id <= self.max
    }

    /// True for the synthetic "nothing known" results.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.name, RESERVED | UNDEFINED | VENDOR_DEFINED)
    }
}

impl fmt::Display for UsageDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const RESERVED: &str = "RESERVED";
const UNDEFINED: &str = "UNDEFINED";
const VENDOR_DEFINED: &str = "Vendor-Defined";

const NONE: UsageControlFlags = UsageControlFlags::empty();
const OOC: UsageControlFlags = UsageControlFlags::ON_OFF_CONTROL;
const MC: UsageControlFlags = UsageControlFlags::MOMENTARY_CONTROL;
const OSC: UsageControlFlags = UsageControlFlags::ONE_SHOT_CONTROL;
const SEL: UsageControlFlags = UsageControlFlags::SELECTOR;
const DV: UsageControlFlags = UsageControlFlags::DYNAMIC_VALUE;
const DF: UsageControlFlags = UsageControlFlags::DYNAMIC_FLAG;
const NARY: UsageControlFlags = UsageControlFlags::NAMED_ARRAY;
const CA: UsageControlFlags = UsageControlFlags::APPLICATION_COLLECTION;
const CL: UsageControlFlags = UsageControlFlags::LOGICAL_COLLECTION;
const CP: UsageControlFlags = UsageControlFlags::PHYSICAL_COLLECTION;
const UM: UsageControlFlags = UsageControlFlags::USAGE_MODIFIER;

const GENERIC: u16 = 0x01;
const SIMULATION: u16 = 0x02;
const VIRTUAL_REALITY: u16 = 0x03;
const GAME_CONTROLS: u16 = 0x05;
const BUTTON: u16 = 0x09;
const ORDINAL: u16 = 0x0A;
const CONSUMER: u16 = 0x0C;
const PID: u16 = 0x0F;

// `|` on bitflags is not const; combinations are spelled with `union`.
const MC_DV: UsageControlFlags = MC.union(DV);
const OSC_DF: UsageControlFlags = OSC.union(DF);
const DV_DF: UsageControlFlags = DV.union(DF);
const BUTTON_FLAGS: UsageControlFlags = SEL.union(OOC).union(MC).union(OSC);

#[rustfmt::skip]
static USAGE_DEFINITIONS: &[UsageDef] = &[
    // Generic Desktop
    UsageDef::new(GENERIC, 0x01, 0x01, CP, "Pointer"),
    UsageDef::new(GENERIC, 0x02, 0x02, CA, "Mouse"),
    UsageDef::new(GENERIC, 0x03, 0x03, NONE, RESERVED),
    UsageDef::new(GENERIC, 0x04, 0x04, CA, "Joystick"),
    UsageDef::new(GENERIC, 0x05, 0x05, CA, "Gamepad"),
    UsageDef::new(GENERIC, 0x06, 0x06, CA, "Keyboard"),
    UsageDef::new(GENERIC, 0x07, 0x07, CA, "Keypad"),
    UsageDef::new(GENERIC, 0x08, 0x08, CA, "Multi-Axis Controller"),
    UsageDef::new(GENERIC, 0x09, 0x09, CA, "Tablet PC Controls"),
    UsageDef::new(GENERIC, 0x0A, 0x0A, CA, "Water Cooling Device"),
    UsageDef::new(GENERIC, 0x0B, 0x0B, CA, "Computer Chassis Device"),
    UsageDef::new(GENERIC, 0x0C, 0x0C, CA, "Wireless Radio Controls"),
    UsageDef::new(GENERIC, 0x0D, 0x0D, CA, "Portable Device Controls"),
    UsageDef::new(GENERIC, 0x0E, 0x0E, CA, "System Multi-Axis Controller"),
    UsageDef::new(GENERIC, 0x0F, 0x0F, CA, "Spatial Controller"),
    UsageDef::new(GENERIC, 0x10, 0x10, CA, "Assistive Control"),
    UsageDef::new(GENERIC, 0x11, 0x11, CA, "Device Dock"),
    UsageDef::new(GENERIC, 0x13, 0x2F, NONE, RESERVED),
    UsageDef::new(GENERIC, 0x30, 0x30, DV, "X"),
    UsageDef::new(GENERIC, 0x31, 0x31, DV, "Y"),
    UsageDef::new(GENERIC, 0x32, 0x32, DV, "Z"),
    UsageDef::new(GENERIC, 0x33, 0x33, DV, "Rx"),
    UsageDef::new(GENERIC, 0x34, 0x34, DV, "Ry"),
    UsageDef::new(GENERIC, 0x35, 0x35, DV, "Rz"),
    UsageDef::new(GENERIC, 0x36, 0x36, DV, "Slider"),
    UsageDef::new(GENERIC, 0x37, 0x37, DV, "Dial"),
    UsageDef::new(GENERIC, 0x38, 0x38, DV, "Wheel"),
    UsageDef::new(GENERIC, 0x39, 0x39, DV, "Hat Switch"),
    UsageDef::new(GENERIC, 0x3A, 0x3A, CL, "Counted Buffer"),
    UsageDef::new(GENERIC, 0x3B, 0x3B, DV, "Byte Count"),
    UsageDef::new(GENERIC, 0x3C, 0x3C, OSC_DF, "Motion Wakeup"),
    UsageDef::new(GENERIC, 0x3D, 0x3D, OOC, "Start"),
    UsageDef::new(GENERIC, 0x3E, 0x3E, OOC, "Select"),
    UsageDef::new(GENERIC, 0x3F, 0x3F, NONE, RESERVED),
    UsageDef::new(GENERIC, 0x40, 0x40, DV, "Vx"),
    UsageDef::new(GENERIC, 0x41, 0x41, DV, "Vy"),
    UsageDef::new(GENERIC, 0x42, 0x42, DV, "Vz"),
    UsageDef::new(GENERIC, 0x43, 0x43, DV, "Vbrx"),
    UsageDef::new(GENERIC, 0x44, 0x44, DV, "Vbry"),
    UsageDef::new(GENERIC, 0x45, 0x45, DV, "Vbrz"),
    UsageDef::new(GENERIC, 0x46, 0x46, DV, "Vno"),
    UsageDef::new(GENERIC, 0x47, 0x47, DV_DF, "Feature Notification"),
    UsageDef::new(GENERIC, 0x48, 0x48, DV, "Resolution Multiplier"),
    UsageDef::new(GENERIC, 0x80, 0x80, CA, "System Control"),
    UsageDef::new(GENERIC, 0x81, 0x81, OSC, "System Power Down"),
    UsageDef::new(GENERIC, 0x82, 0x82, OSC, "System Sleep"),
    UsageDef::new(GENERIC, 0x83, 0x83, OSC, "System Wake Up"),
    UsageDef::new(GENERIC, 0x90, 0x90, OOC, "D-pad Up"),
    UsageDef::new(GENERIC, 0x91, 0x91, OOC, "D-pad Down"),
    UsageDef::new(GENERIC, 0x92, 0x92, OOC, "D-pad Right"),
    UsageDef::new(GENERIC, 0x93, 0x93, OOC, "D-pad Left"),
    UsageDef::new(GENERIC, 0x94, 0x94, MC_DV, "Index Trigger"),
    UsageDef::new(GENERIC, 0x95, 0x95, MC_DV, "Palm Trigger"),
    UsageDef::new(GENERIC, 0xD7, 0xFFFF, NONE, RESERVED),

    // Simulation Controls
    UsageDef::new(SIMULATION, 0x01, 0x01, CA, "Flight Simulation Device"),
    UsageDef::new(SIMULATION, 0x02, 0x02, CA, "Automobile Simulation Device"),
    UsageDef::new(SIMULATION, 0x03, 0x03, CA, "Tank Simulation Device"),
    UsageDef::new(SIMULATION, 0x04, 0x04, CA, "Spaceship Simulation Device"),
    UsageDef::new(SIMULATION, 0x05, 0x05, CA, "Submarine Simulation Device"),
    UsageDef::new(SIMULATION, 0x06, 0x06, CA, "Sailing Simulation Device"),
    UsageDef::new(SIMULATION, 0x07, 0x07, CA, "Motorcycle Simulation Device"),
    UsageDef::new(SIMULATION, 0x08, 0x08, CA, "Sports Simulation Device"),
    UsageDef::new(SIMULATION, 0x09, 0x09, CA, "Airplane Simulation Device"),
    UsageDef::new(SIMULATION, 0x0A, 0x0A, CA, "Helicopter Simulation Device"),
    UsageDef::new(SIMULATION, 0x0B, 0x0B, CA, "Magic Carpet Simulation Device"),
    UsageDef::new(SIMULATION, 0x0C, 0x0C, CA, "Bicycle Simulation Device"),
    UsageDef::new(SIMULATION, 0x0D, 0x1F, NONE, RESERVED),
    UsageDef::new(SIMULATION, 0x20, 0x20, CA, "Flight Control Stick"),
    UsageDef::new(SIMULATION, 0x21, 0x21, CA, "Flight Stick"),
    UsageDef::new(SIMULATION, 0x22, 0x22, CP, "Cyclic Control"),
    UsageDef::new(SIMULATION, 0x23, 0x23, CP, "Cyclic Trim"),
    UsageDef::new(SIMULATION, 0x24, 0x24, CA, "Flight Yoke"),
    UsageDef::new(SIMULATION, 0x25, 0x25, CP, "Track Control"),
    UsageDef::new(SIMULATION, 0xB0, 0xB0, DV, "Aileron"),
    UsageDef::new(SIMULATION, 0xB1, 0xB1, DV, "Aileron Trim"),
    UsageDef::new(SIMULATION, 0xB2, 0xB2, DV, "Anti-Torque Control"),
    UsageDef::new(SIMULATION, 0xB3, 0xB3, OOC, "Autopilot Enable"),
    UsageDef::new(SIMULATION, 0xB4, 0xB4, OSC, "Chaff Release"),
    UsageDef::new(SIMULATION, 0xB5, 0xB5, DV, "Collective Control"),
    UsageDef::new(SIMULATION, 0xB6, 0xB6, DV, "Dive Brake"),
    UsageDef::new(SIMULATION, 0xB7, 0xB7, OOC, "Electronic Countermeasures"),
    UsageDef::new(SIMULATION, 0xB8, 0xB8, DV, "Elevator"),
    UsageDef::new(SIMULATION, 0xB9, 0xB9, DV, "Elevator Trim"),
    UsageDef::new(SIMULATION, 0xBA, 0xBA, DV, "Rudder"),
    UsageDef::new(SIMULATION, 0xBB, 0xBB, DV, "Throttle"),
    UsageDef::new(SIMULATION, 0xBC, 0xBC, OOC, "Flight Communications"),
    UsageDef::new(SIMULATION, 0xBD, 0xBD, OSC, "Flare Release"),
    UsageDef::new(SIMULATION, 0xBE, 0xBE, OOC, "Landing Gear"),
    UsageDef::new(SIMULATION, 0xBF, 0xBF, DV, "Toe Brake"),
    UsageDef::new(SIMULATION, 0xC0, 0xC0, MC, "Trigger"),
    UsageDef::new(SIMULATION, 0xC1, 0xC1, OOC, "Weapons Arm"),
    UsageDef::new(SIMULATION, 0xC2, 0xC2, OSC, "Weapons Select"),
    UsageDef::new(SIMULATION, 0xC3, 0xC3, DV, "Wing Flaps"),
    UsageDef::new(SIMULATION, 0xC4, 0xC4, DV, "Accelerator"),
    UsageDef::new(SIMULATION, 0xC5, 0xC5, DV, "Brake"),
    UsageDef::new(SIMULATION, 0xC6, 0xC6, DV, "Clutch"),
    UsageDef::new(SIMULATION, 0xC7, 0xC7, DV, "Shifter"),
    UsageDef::new(SIMULATION, 0xC8, 0xC8, DV, "Steering"),
    UsageDef::new(SIMULATION, 0xC9, 0xC9, DV, "Turret Direction"),
    UsageDef::new(SIMULATION, 0xCA, 0xCA, DV, "Barrel Elevation"),
    UsageDef::new(SIMULATION, 0xCB, 0xCB, DV, "Dive Plane"),
    UsageDef::new(SIMULATION, 0xCC, 0xCC, DV, "Ballast"),
    UsageDef::new(SIMULATION, 0xCD, 0xCD, DV, "Bicycle Crank"),
    UsageDef::new(SIMULATION, 0xCE, 0xCE, DV, "Handle Bars"),
    UsageDef::new(SIMULATION, 0xCF, 0xCF, DV, "Front Brake"),
    UsageDef::new(SIMULATION, 0xD0, 0xD0, DV, "Rear Brake"),
    UsageDef::new(SIMULATION, 0xD1, 0xFFFF, NONE, RESERVED),

    // VR Controls
    UsageDef::new(VIRTUAL_REALITY, 0x01, 0x01, CA, "Belt"),
    UsageDef::new(VIRTUAL_REALITY, 0x02, 0x02, CA, "Body Suit"),
    UsageDef::new(VIRTUAL_REALITY, 0x03, 0x03, CP, "Flexor"),
    UsageDef::new(VIRTUAL_REALITY, 0x04, 0x04, CA, "Glove"),
    UsageDef::new(VIRTUAL_REALITY, 0x05, 0x05, CP, "Head Tracker"),
    UsageDef::new(VIRTUAL_REALITY, 0x06, 0x06, CA, "Head Mounted Display"),
    UsageDef::new(VIRTUAL_REALITY, 0x07, 0x07, CA, "Hand Tracker"),
    UsageDef::new(VIRTUAL_REALITY, 0x08, 0x08, CA, "Oculometer"),
    UsageDef::new(VIRTUAL_REALITY, 0x09, 0x09, CA, "Vest"),
    UsageDef::new(VIRTUAL_REALITY, 0x0A, 0x0A, CA, "Animatronic Device"),
    UsageDef::new(VIRTUAL_REALITY, 0x0B, 0x1F, NONE, RESERVED),
    UsageDef::new(VIRTUAL_REALITY, 0x20, 0x20, OOC, "Stereo Enable"),
    UsageDef::new(VIRTUAL_REALITY, 0x21, 0x21, OOC, "Display Enable"),
    UsageDef::new(VIRTUAL_REALITY, 0x00, 0xFFFF, NONE, RESERVED),

    // Game Controls
    UsageDef::new(GAME_CONTROLS, 0x01, 0x01, CA, "3D Game Controller"),
    UsageDef::new(GAME_CONTROLS, 0x02, 0x02, CA, "Pinball Device"),
    UsageDef::new(GAME_CONTROLS, 0x03, 0x03, CA, "Gun Device"),
    UsageDef::new(GAME_CONTROLS, 0x04, 0x1F, NONE, RESERVED),
    UsageDef::new(GAME_CONTROLS, 0x20, 0x20, CP, "Point of View"),
    UsageDef::new(GAME_CONTROLS, 0x21, 0x21, DV, "Turn Right/Left"),
    UsageDef::new(GAME_CONTROLS, 0x22, 0x22, DV, "Pitch Forward/Backward"),
    UsageDef::new(GAME_CONTROLS, 0x23, 0x23, DV, "Roll Right/Left"),
    UsageDef::new(GAME_CONTROLS, 0x24, 0x24, DV, "Move Right/Left"),
    UsageDef::new(GAME_CONTROLS, 0x25, 0x25, DV, "Move Forward/Backward"),
    UsageDef::new(GAME_CONTROLS, 0x26, 0x26, DV, "Move Up/Down"),
    UsageDef::new(GAME_CONTROLS, 0x27, 0x27, DV, "Lean Left/Right"),
    UsageDef::new(GAME_CONTROLS, 0x28, 0x28, DV, "Lean Forward/Backward"),
    UsageDef::new(GAME_CONTROLS, 0x29, 0x29, DV, "Height of POV"),
    UsageDef::new(GAME_CONTROLS, 0x2A, 0x2A, MC, "Flipper"),
    UsageDef::new(GAME_CONTROLS, 0x2B, 0x2B, MC, "Secondary Flipper"),
    UsageDef::new(GAME_CONTROLS, 0x2C, 0x2C, MC, "Bump"),
    UsageDef::new(GAME_CONTROLS, 0x2D, 0x2D, OSC, "New Game"),
    UsageDef::new(GAME_CONTROLS, 0x2E, 0x2E, OSC, "Shoot Ball"),
    UsageDef::new(GAME_CONTROLS, 0x2F, 0x2F, OSC, "Player"),

    // Buttons are all just buttons.
    UsageDef::new(BUTTON, 0x00, 0xFFFF, BUTTON_FLAGS, "Button"),

    UsageDef::new(ORDINAL, 0x00, 0xFFFF, UM, "Ordinal Instance"),

    // Consumer
    UsageDef::new(CONSUMER, 0x01, 0x01, CA, "Consumer Control"),
    UsageDef::new(CONSUMER, 0x02, 0x02, NARY, "Numeric Key Pad"),
    UsageDef::new(CONSUMER, 0x03, 0x03, NARY, "Programmable Buttons"),
    UsageDef::new(CONSUMER, 0x04, 0x04, CA, "Microphone"),
    UsageDef::new(CONSUMER, 0x05, 0x05, CA, "Headphone"),
    UsageDef::new(CONSUMER, 0x06, 0x06, CA, "Graphic Equalizer"),
    UsageDef::new(CONSUMER, 0x07, 0x1F, NONE, RESERVED),

    // Physical Interface Device (force feedback)
    UsageDef::new(PID, 0x01, 0x01, CA, "Physical Interface Device"),
    UsageDef::new(PID, 0x02, 0x1F, NONE, RESERVED),
    UsageDef::new(PID, 0x20, 0x20, DV, "Normal"),
    UsageDef::new(PID, 0x21, 0x21, CL, "Set Effect Report"),
    UsageDef::new(PID, 0x22, 0x22, DV, "Effect Block Index"),
    UsageDef::new(PID, 0x23, 0x23, DV, "Parameter Block Offset"),
    UsageDef::new(PID, 0x24, 0x24, DV, "ROM Flag"),
    UsageDef::new(PID, 0x25, 0x25, NARY, "Effect Type"),
    UsageDef::new(PID, 0x26, 0x26, SEL, "ET Constant Force"),
    UsageDef::new(PID, 0x27, 0x27, SEL, "ET Ramp"),
    UsageDef::new(PID, 0x28, 0x28, SEL, "ET Custom Force Data"),
    UsageDef::new(PID, 0x29, 0x2F, NONE, RESERVED),
    UsageDef::new(PID, 0x30, 0x30, SEL, "ET Square"),
    UsageDef::new(PID, 0x31, 0x31, SEL, "ET Sine"),
    UsageDef::new(PID, 0x32, 0x32, SEL, "ET Triangle"),
    UsageDef::new(PID, 0x33, 0x33, SEL, "ET Sawtooth Up"),
    UsageDef::new(PID, 0x34, 0x34, SEL, "ET Sawtooth Down"),
    UsageDef::new(PID, 0x35, 0x3F, NONE, RESERVED),
    UsageDef::new(PID, 0x40, 0x40, SEL, "ET Spring"),
    UsageDef::new(PID, 0x41, 0x41, SEL, "ET Damper"),
    UsageDef::new(PID, 0x42, 0x42, SEL, "ET Inertia"),
    UsageDef::new(PID, 0x43, 0x43, SEL, "ET Friction"),
    UsageDef::new(PID, 0x44, 0x4F, NONE, RESERVED),
    UsageDef::new(PID, 0x50, 0x50, DV, "Duration"),
    UsageDef::new(PID, 0x51, 0x51, DV, "Sample Period"),
    UsageDef::new(PID, 0x52, 0x52, DV, "Gain"),
    UsageDef::new(PID, 0x53, 0x53, DV, "Trigger Button"),
    UsageDef::new(PID, 0x54, 0x54, DV, "Trigger Repeat Interval"),
    UsageDef::new(PID, 0x55, 0x55, UsageControlFlags::USAGE_SWITCH, "Axes Enable"),
    UsageDef::new(PID, 0x56, 0x56, DV, "Direction Enable"),
    UsageDef::new(PID, 0x57, 0x57, CL, "Direction"),
    UsageDef::new(PID, 0x58, 0x58, CL, "Type Specific Block Offset"),
    UsageDef::new(PID, 0x59, 0x59, NARY, "Block Type"),
    UsageDef::new(PID, 0x5A, 0x5A, CL, "Set Envelope Report"),
    UsageDef::new(PID, 0x5B, 0x5B, DV, "Attack Level"),
    UsageDef::new(PID, 0x5C, 0x5C, DV, "Attack Time"),
    UsageDef::new(PID, 0x5D, 0x5D, DV, "Fade Level"),
    UsageDef::new(PID, 0x5E, 0x5E, DV, "Fade Time"),
    UsageDef::new(PID, 0x5F, 0x5F, CL, "Set Condition Report"),
    UsageDef::new(PID, 0x60, 0x60, DV, "CP Offset"),
    UsageDef::new(PID, 0x61, 0x61, DV, "Positive Coefficient"),
    UsageDef::new(PID, 0x62, 0x62, DV, "Negative Coefficient"),
    UsageDef::new(PID, 0x63, 0x63, DV, "Positive Saturation"),
    UsageDef::new(PID, 0x64, 0x64, DV, "Negative Saturation"),
    UsageDef::new(PID, 0x65, 0x65, DV, "Dead Band"),
    UsageDef::new(PID, 0x66, 0x66, CL, "Download Force Sample"),
    UsageDef::new(PID, 0x67, 0x67, DV, "Isoch Custom Force Enable"),
    UsageDef::new(PID, 0x68, 0x68, CL, "Custom Force Data Report"),
    UsageDef::new(PID, 0x69, 0x69, DV, "Custom Force Data"),
    UsageDef::new(PID, 0x6A, 0x6A, DV, "Custom Force Vendor Defined Data"),
    UsageDef::new(PID, 0x6B, 0x6B, CL, "Set Custom Force Report"),
    UsageDef::new(PID, 0x6C, 0x6C, DV, "Custom Force Data Offset"),
    UsageDef::new(PID, 0x6D, 0x6D, DV, "Sample Count"),
    UsageDef::new(PID, 0x6E, 0x6E, CL, "Set Periodic Report"),
    UsageDef::new(PID, 0x6F, 0x6F, DV, "Offset"),
    UsageDef::new(PID, 0x70, 0x70, DV, "Magnitude"),
    UsageDef::new(PID, 0x71, 0x71, DV, "Phase"),
    UsageDef::new(PID, 0x72, 0x72, DV, "Period"),
    UsageDef::new(PID, 0x73, 0x73, CL, "Set Constant Force Report"),
    UsageDef::new(PID, 0x74, 0x74, CL, "Set Ramp Force Report"),
    UsageDef::new(PID, 0x75, 0x75, DV, "Ramp Start"),
    UsageDef::new(PID, 0x76, 0x76, DV, "Ramp End"),
    UsageDef::new(PID, 0x77, 0x77, CL, "Effect Operation Report"),
    UsageDef::new(PID, 0x78, 0x78, NARY, "Effect Operation"),
    UsageDef::new(PID, 0x79, 0x79, SEL, "Op Effect Start"),
    UsageDef::new(PID, 0x7A, 0x7A, SEL, "Op Effect Start Solo"),
    UsageDef::new(PID, 0x7B, 0x7B, SEL, "Op Effect Stop"),
    UsageDef::new(PID, 0x7C, 0x7C, DV, "Loop Count"),
    UsageDef::new(PID, 0x7D, 0x7D, CL, "Device Gain Report"),
    UsageDef::new(PID, 0x7E, 0x7E, DV, "Device Gain"),
    UsageDef::new(PID, 0x7F, 0x7F, CL, "PID Pool Report"),
    UsageDef::new(PID, 0x80, 0x80, DV, "RAM Pool Size"),
    UsageDef::new(PID, 0x81, 0x81, UsageControlFlags::STATIC_VALUE, "ROM Pool Size"),
    UsageDef::new(PID, 0x82, 0x82, UsageControlFlags::STATIC_VALUE, "ROM Effect Block Count"),
    UsageDef::new(PID, 0x83, 0x83, UsageControlFlags::STATIC_VALUE, "Simultaneous Effects Max"),
    UsageDef::new(PID, 0x84, 0x84, UsageControlFlags::STATIC_VALUE, "Pool Alignment"),
    UsageDef::new(PID, 0x85, 0x85, CL, "PID Pool Move Report"),
    UsageDef::new(PID, 0x86, 0x86, DV, "Move Source"),
    UsageDef::new(PID, 0x87, 0x87, DV, "Move Destination"),
    UsageDef::new(PID, 0x88, 0x88, DV, "Move Length"),
    UsageDef::new(PID, 0x89, 0x89, CL, "PID Block Load Report"),
    UsageDef::new(PID, 0x8A, 0x8A, NONE, RESERVED),
    UsageDef::new(PID, 0x8B, 0x8B, NARY, "Block Load Status"),
    UsageDef::new(PID, 0x8C, 0x8C, SEL, "Block Load Success"),
    UsageDef::new(PID, 0x8D, 0x8D, SEL, "Block Load Full"),
    UsageDef::new(PID, 0x8E, 0x8E, SEL, "Block Load Error"),
    UsageDef::new(PID, 0x8F, 0x8F, DV, "Block Handle"),
    UsageDef::new(PID, 0x90, 0x90, CL, "PID Block Free Report"),
    UsageDef::new(PID, 0x91, 0x91, CL, "Type Specific Block Handle"),
    UsageDef::new(PID, 0x92, 0x92, CL, "PID State Report"),
    UsageDef::new(PID, 0x93, 0x93, NONE, RESERVED),
    UsageDef::new(PID, 0x94, 0x94, DF, "Effect Playing"),
    UsageDef::new(PID, 0x95, 0x95, CL, "PID Device Control Report"),
    UsageDef::new(PID, 0x96, 0x96, NARY, "PID Device Control"),
    UsageDef::new(PID, 0x97, 0x97, SEL, "DC Enable Actuators"),
    UsageDef::new(PID, 0x98, 0x98, SEL, "DC Disable Actuators"),
    UsageDef::new(PID, 0x99, 0x99, SEL, "DC Stop All Effects"),
    UsageDef::new(PID, 0x9A, 0x9A, SEL, "DC Device Reset"),
    UsageDef::new(PID, 0x9B, 0x9B, SEL, "DC Device Pause"),
    UsageDef::new(PID, 0x9C, 0x9C, SEL, "DC Device Continue"),
    UsageDef::new(PID, 0x9D, 0x9E, NONE, RESERVED),
    UsageDef::new(PID, 0x9F, 0x9F, DF, "Device Paused"),
    UsageDef::new(PID, 0xA0, 0xA0, DF, "Actuators Enabled"),
    UsageDef::new(PID, 0xA1, 0xA3, NONE, RESERVED),
    UsageDef::new(PID, 0xA4, 0xA4, DF, "Safety Switch"),
    UsageDef::new(PID, 0xA5, 0xA5, DF, "Actuator Override Switch"),
    UsageDef::new(PID, 0xA6, 0xA6, DF, "Actuator Power"),
    UsageDef::new(PID, 0xA7, 0xA7, DV, "Start Delay"),
    UsageDef::new(PID, 0xA8, 0xA8, CL, "Parameter Block Size"),
    UsageDef::new(PID, 0xA9, 0xA9, UsageControlFlags::STATIC_FLAG, "Device Managed Pool"),
    UsageDef::new(PID, 0xAA, 0xAA, UsageControlFlags::STATIC_FLAG, "Shared Parameter Blocks"),
    UsageDef::new(PID, 0xAB, 0xAB, CL, "Create New Effect Report"),
    UsageDef::new(PID, 0xAC, 0xAC, DV, "RAM Pool Available"),
    UsageDef::new(PID, 0xAD, 0xFFFF, NONE, RESERVED),
];

/// The static table, in lookup order.
pub fn usage_definitions() -> &'static [UsageDef] {
    USAGE_DEFINITIONS
}

/// Resolve `(page, usage_id)` to its table entry.
///
/// - pages `>= 0xFF00` resolve to a synthetic `"Vendor-Defined"` entry
/// - pages in `0x93..0xF1D0` or `>= 0xF1D1` resolve to a synthetic `"RESERVED"` entry
/// - otherwise the first matching table range wins
/// - no match resolves to a synthetic `"UNDEFINED"` entry
///
/// Pure and allocation-free; safe to call from any thread.
pub fn find_usage_definition(page: u16, usage_id: u16) -> UsageDef {
    if page >= 0xFF00 {
        return UsageDef::new(page, 0x0000, 0xFFFF, NONE, VENDOR_DEFINED);
    }

    if page >= 0xF1D1 || (0x93..0xF1D0).contains(&page) {
        return UsageDef::new(page, 0x0000, 0xFFFF, NONE, RESERVED);
    }

    USAGE_DEFINITIONS
        .iter()
        .find(|def| def.page == page && def.contains(usage_id))
        .copied()
        .unwrap_or(UsageDef::new(page, 0x0000, 0xFFFF, NONE, UNDEFINED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generic_desktop_axes() {
        let x = find_usage_definition(0x01, 0x30);
        assert_eq!(x.name, "X");
        assert_eq!(x.control_type, UsageControlFlags::DYNAMIC_VALUE);

        assert_eq!(find_usage_definition(0x01, 0x39).name, "Hat Switch");
        assert_eq!(find_usage_definition(0x01, 0x04).name, "Joystick");
    }

    #[test]
    fn ranges_match_inclusively() {
        assert_eq!(find_usage_definition(0x01, 0x13).name, RESERVED);
        assert_eq!(find_usage_definition(0x01, 0x2F).name, RESERVED);
        assert_eq!(find_usage_definition(0x09, 0x00).name, "Button");
        assert_eq!(find_usage_definition(0x09, 0xFFFF).name, "Button");
    }

    #[test]
    fn force_feedback_usages() {
        assert_eq!(find_usage_definition(0x0F, 0x26).name, "ET Constant Force");
        assert_eq!(find_usage_definition(0x0F, 0x64).name, "Negative Saturation");
        assert_eq!(find_usage_definition(0x0F, 0xAC).name, "RAM Pool Available");
        assert_eq!(find_usage_definition(0x0F, 0xAD).name, RESERVED);
    }

    #[test]
    fn simulation_driving_controls() {
        assert_eq!(find_usage_definition(0x02, 0xC8).name, "Steering");
        assert_eq!(find_usage_definition(0x02, 0xC4).name, "Accelerator");
        assert_eq!(find_usage_definition(0x02, 0xC5).name, "Brake");
    }

    #[test]
    fn vendor_and_reserved_pages() {
        let v = find_usage_definition(0xFF00, 0x01);
        assert_eq!(v.name, VENDOR_DEFINED);
        assert_eq!(v.page, 0xFF00);
        assert!(v.is_placeholder());

        assert_eq!(find_usage_definition(0xFFFF, 0xFFFF).name, VENDOR_DEFINED);
        assert_eq!(find_usage_definition(0x93, 0).name, RESERVED);
        assert_eq!(find_usage_definition(0xF1CF, 0).name, RESERVED);
        assert_eq!(find_usage_definition(0xF1D1, 0).name, RESERVED);
    }

    #[test]
    fn page_f1d0_is_not_reserved() {
        // FIDO Alliance page: not in the table, but also not a reserved page.
        assert_eq!(find_usage_definition(0xF1D0, 0x01).name, UNDEFINED);
    }

    #[test]
    fn unknown_usage_is_undefined() {
        let def = find_usage_definition(0x07, 0x04);
        assert_eq!(def.name, UNDEFINED);
        assert_eq!(def.min, 0);
        assert_eq!(def.max, 0xFFFF);
        assert!(def.is_placeholder());
    }

    #[test]
    fn table_ranges_are_well_formed() {
        for def in usage_definitions() {
            assert!(def.min <= def.max, "{def:?} has an inverted range");
        }
    }

    proptest! {
        #[test]
        fn lookup_is_deterministic(page in any::<u16>(), usage in any::<u16>()) {
            let a = find_usage_definition(page, usage);
            let b = find_usage_definition(page, usage);
            prop_assert_eq!(a, b);
            prop_assert!(a.contains(usage));
        }
    }
}
