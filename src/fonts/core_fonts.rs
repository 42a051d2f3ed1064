//! Base-14 core fonts.
//!
//! Core fonts are never embedded: the document only needs their metrics to
//! lay out text. Width tables are indexed by WinAnsi (cp1252) code for the
//! Latin families and by the font's built-in encoding for Symbol and
//! ZapfDingbats.

use crate::fonts::definition::{
    FontBox, FontDefinition, FontDescriptor, FontKind, FLAG_FIXED_PITCH, FLAG_ITALIC,
    FLAG_NONSYMBOLIC, FLAG_SYMBOLIC,
};
use std::collections::HashMap;

static HELVETICA_WIDTHS: [u16; 256] = [
    278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278,
    278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278,
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 350,
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

static HELVETICA_BOLD_WIDTHS: [u16; 256] = [
    278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278,
    278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278, 278,
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350,
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

static TIMES_ROMAN_WIDTHS: [u16; 256] = [
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, 350,
    500, 350, 333, 500, 444, 1000, 500, 500, 333, 1000, 556, 333, 889, 350, 611, 350,
    350, 333, 333, 444, 444, 350, 500, 1000, 333, 980, 389, 333, 722, 350, 444, 722,
    250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500, 564, 333, 760, 333,
    400, 564, 300, 300, 333, 500, 453, 250, 333, 300, 310, 500, 750, 750, 750, 444,
    722, 722, 722, 722, 722, 722, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
    722, 722, 722, 722, 722, 722, 722, 564, 722, 722, 722, 722, 722, 722, 556, 500,
    444, 444, 444, 444, 444, 444, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 500, 500, 500, 500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500,
];

static TIMES_BOLD_WIDTHS: [u16; 256] = [
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520, 350,
    500, 350, 333, 500, 500, 1000, 500, 500, 333, 1000, 556, 333, 1000, 350, 667, 350,
    350, 333, 333, 500, 500, 350, 500, 1000, 333, 1000, 389, 333, 722, 350, 444, 722,
    250, 333, 500, 500, 500, 500, 220, 500, 333, 747, 300, 500, 570, 333, 747, 333,
    400, 570, 300, 300, 333, 556, 540, 250, 333, 300, 330, 500, 750, 750, 750, 500,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 389, 389, 389, 389,
    722, 722, 778, 778, 778, 778, 778, 570, 778, 722, 722, 722, 722, 722, 611, 556,
    500, 500, 500, 500, 500, 500, 722, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 556, 500, 500, 500, 500, 500, 570, 500, 556, 556, 556, 556, 500, 556, 500,
];

static TIMES_ITALIC_WIDTHS: [u16; 256] = [
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541, 350,
    500, 350, 333, 500, 556, 889, 500, 500, 333, 1000, 500, 333, 944, 350, 556, 350,
    350, 333, 333, 556, 556, 350, 500, 889, 333, 980, 389, 333, 667, 350, 389, 556,
    250, 389, 500, 500, 500, 500, 275, 500, 333, 760, 276, 500, 675, 333, 760, 333,
    400, 675, 300, 300, 333, 500, 523, 250, 333, 300, 310, 500, 750, 750, 750, 500,
    611, 611, 611, 611, 611, 611, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333,
    722, 667, 722, 722, 722, 722, 722, 675, 722, 722, 722, 722, 722, 556, 611, 500,
    500, 500, 500, 500, 500, 500, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 500, 500, 500, 500, 500, 500, 675, 500, 500, 500, 500, 500, 444, 500, 444,
];

static TIMES_BOLD_ITALIC_WIDTHS: [u16; 256] = [
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570, 350,
    500, 350, 333, 500, 500, 1000, 500, 500, 333, 1000, 556, 333, 944, 350, 611, 350,
    350, 333, 333, 500, 500, 350, 500, 1000, 333, 1000, 389, 333, 722, 350, 389, 611,
    250, 389, 500, 500, 500, 500, 220, 500, 333, 747, 266, 500, 606, 333, 747, 333,
    400, 570, 300, 300, 333, 576, 500, 250, 333, 300, 300, 500, 750, 750, 750, 500,
    667, 667, 667, 667, 667, 667, 944, 667, 667, 667, 667, 667, 389, 389, 389, 389,
    722, 722, 722, 722, 722, 722, 722, 570, 722, 722, 722, 722, 722, 611, 611, 500,
    500, 500, 500, 500, 500, 500, 722, 444, 444, 444, 444, 444, 278, 278, 278, 278,
    500, 556, 500, 500, 500, 500, 500, 570, 500, 556, 556, 556, 556, 444, 500, 444,
];

static SYMBOL_WIDTHS: [u16; 256] = [
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250, 250,
    250, 333, 713, 500, 549, 833, 778, 439, 333, 333, 500, 549, 250, 549, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 549, 549, 549, 444,
    549, 722, 667, 722, 612, 611, 763, 603, 722, 333, 631, 722, 686, 889, 722, 722,
    768, 741, 556, 592, 611, 690, 439, 768, 645, 795, 611, 333, 863, 333, 658, 500,
    500, 631, 549, 549, 494, 439, 521, 411, 603, 329, 603, 549, 549, 576, 521, 549,
    549, 521, 549, 603, 439, 576, 713, 686, 493, 686, 494, 480, 200, 480, 549, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    750, 620, 247, 549, 167, 713, 500, 753, 753, 753, 753, 1042, 987, 603, 987, 603,
    400, 549, 411, 549, 549, 713, 494, 460, 549, 549, 549, 549, 1000, 603, 1000, 658,
    823, 686, 795, 987, 768, 768, 823, 768, 768, 713, 713, 713, 713, 713, 713, 713,
    768, 713, 790, 790, 890, 823, 549, 250, 713, 603, 603, 1042, 987, 603, 987, 603,
    494, 329, 790, 790, 786, 713, 384, 384, 384, 384, 384, 384, 384, 384, 384, 384,
    0, 329, 274, 686, 686, 686, 384, 384, 384, 384, 384, 384, 384, 384, 384, 0,
];

static ZAPF_DINGBATS_WIDTHS: [u16; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    278, 974, 961, 974, 980, 719, 789, 790, 791, 690, 960, 939, 549, 855, 911, 933,
    911, 945, 974, 755, 846, 762, 761, 571, 677, 763, 760, 759, 754, 494, 552, 537,
    577, 692, 786, 788, 788, 790, 793, 794, 816, 823, 789, 841, 823, 833, 816, 831,
    923, 744, 723, 749, 790, 792, 695, 776, 768, 792, 759, 707, 708, 682, 701, 826,
    815, 789, 789, 707, 687, 696, 689, 786, 787, 713, 791, 785, 791, 873, 761, 762,
    762, 759, 759, 892, 892, 788, 784, 438, 138, 277, 415, 392, 392, 668, 668, 0,
    390, 390, 317, 317, 276, 276, 509, 509, 410, 410, 234, 234, 334, 334, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 732, 544, 544, 910, 667, 760, 760, 776, 595, 694, 626, 788, 788, 788, 788,
    788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788,
    788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788, 788,
    788, 788, 788, 788, 894, 838, 1016, 458, 748, 924, 748, 918, 927, 928, 928, 834,
    873, 828, 924, 924, 917, 930, 931, 463, 883, 836, 836, 867, 867, 696, 696, 874,
    0, 874, 760, 946, 771, 865, 771, 888, 967, 888, 831, 873, 927, 970, 918, 0,
];

static COURIER_WIDTHS: [u16; 256] = [600; 256];

/// Static metrics of one core font.
struct CoreFont {
    key: &'static str,
    name: &'static str,
    widths: &'static [u16; 256],
    ascent: i32,
    descent: i32,
    cap_height: i32,
    bbox: [i32; 4],
    italic_angle: i32,
    stem_v: i32,
    flags: u32,
}

const LATIN: u32 = FLAG_NONSYMBOLIC;

static CORE_FONT_TABLE: [CoreFont; 14] = [
    CoreFont {
        key: "helvetica",
        name: "Helvetica",
        widths: &HELVETICA_WIDTHS,
        ascent: 718,
        descent: -207,
        cap_height: 718,
        bbox: [-166, -225, 1000, 931],
        italic_angle: 0,
        stem_v: 88,
        flags: LATIN,
    },
    CoreFont {
        key: "helveticaB",
        name: "Helvetica-Bold",
        widths: &HELVETICA_BOLD_WIDTHS,
        ascent: 718,
        descent: -207,
        cap_height: 718,
        bbox: [-170, -228, 1003, 962],
        italic_angle: 0,
        stem_v: 140,
        flags: LATIN,
    },
    CoreFont {
        key: "helveticaI",
        name: "Helvetica-Oblique",
        widths: &HELVETICA_WIDTHS,
        ascent: 718,
        descent: -207,
        cap_height: 718,
        bbox: [-170, -225, 1116, 931],
        italic_angle: -12,
        stem_v: 88,
        flags: LATIN | FLAG_ITALIC,
    },
    CoreFont {
        key: "helveticaBI",
        name: "Helvetica-BoldOblique",
        widths: &HELVETICA_BOLD_WIDTHS,
        ascent: 718,
        descent: -207,
        cap_height: 718,
        bbox: [-174, -228, 1114, 962],
        italic_angle: -12,
        stem_v: 140,
        flags: LATIN | FLAG_ITALIC,
    },
    CoreFont {
        key: "times",
        name: "Times-Roman",
        widths: &TIMES_ROMAN_WIDTHS,
        ascent: 683,
        descent: -217,
        cap_height: 662,
        bbox: [-168, -218, 1000, 898],
        italic_angle: 0,
        stem_v: 84,
        flags: LATIN,
    },
    CoreFont {
        key: "timesB",
        name: "Times-Bold",
        widths: &TIMES_BOLD_WIDTHS,
        ascent: 683,
        descent: -217,
        cap_height: 676,
        bbox: [-168, -218, 1000, 935],
        italic_angle: 0,
        stem_v: 139,
        flags: LATIN,
    },
    CoreFont {
        key: "timesI",
        name: "Times-Italic",
        widths: &TIMES_ITALIC_WIDTHS,
        ascent: 683,
        descent: -217,
        cap_height: 653,
        bbox: [-169, -217, 1010, 883],
        italic_angle: -15,
        stem_v: 76,
        flags: LATIN | FLAG_ITALIC,
    },
    CoreFont {
        key: "timesBI",
        name: "Times-BoldItalic",
        widths: &TIMES_BOLD_ITALIC_WIDTHS,
        ascent: 683,
        descent: -217,
        cap_height: 669,
        bbox: [-200, -218, 996, 921],
        italic_angle: -15,
        stem_v: 121,
        flags: LATIN | FLAG_ITALIC,
    },
    CoreFont {
        key: "courier",
        name: "Courier",
        widths: &COURIER_WIDTHS,
        ascent: 629,
        descent: -157,
        cap_height: 562,
        bbox: [-23, -250, 715, 805],
        italic_angle: 0,
        stem_v: 51,
        flags: LATIN | FLAG_FIXED_PITCH,
    },
    CoreFont {
        key: "courierB",
        name: "Courier-Bold",
        widths: &COURIER_WIDTHS,
        ascent: 629,
        descent: -157,
        cap_height: 562,
        bbox: [-113, -250, 749, 801],
        italic_angle: 0,
        stem_v: 106,
        flags: LATIN | FLAG_FIXED_PITCH,
    },
    CoreFont {
        key: "courierI",
        name: "Courier-Oblique",
        widths: &COURIER_WIDTHS,
        ascent: 629,
        descent: -157,
        cap_height: 562,
        bbox: [-27, -250, 849, 805],
        italic_angle: -12,
        stem_v: 51,
        flags: LATIN | FLAG_FIXED_PITCH | FLAG_ITALIC,
    },
    CoreFont {
        key: "courierBI",
        name: "Courier-BoldOblique",
        widths: &COURIER_WIDTHS,
        ascent: 629,
        descent: -157,
        cap_height: 562,
        bbox: [-57, -250, 869, 801],
        italic_angle: -12,
        stem_v: 106,
        flags: LATIN | FLAG_FIXED_PITCH | FLAG_ITALIC,
    },
    CoreFont {
        key: "symbol",
        name: "Symbol",
        widths: &SYMBOL_WIDTHS,
        ascent: 1010,
        descent: -293,
        cap_height: 1010,
        bbox: [-180, -293, 1090, 1010],
        italic_angle: 0,
        stem_v: 85,
        flags: FLAG_SYMBOLIC,
    },
    CoreFont {
        key: "zapfdingbats",
        name: "ZapfDingbats",
        widths: &ZAPF_DINGBATS_WIDTHS,
        ascent: 820,
        descent: -143,
        cap_height: 820,
        bbox: [-1, -143, 981, 820],
        italic_angle: 0,
        stem_v: 90,
        flags: FLAG_SYMBOLIC,
    },
];

lazy_static::lazy_static! {
    static ref CORE_FONTS: HashMap<&'static str, &'static CoreFont> =
        CORE_FONT_TABLE.iter().map(|f| (f.key, f)).collect();
}

/// Core family names accepted by [`core_definition`].
pub const CORE_FAMILIES: [&str; 5] = ["courier", "helvetica", "symbol", "times", "zapfdingbats"];

/// Map a requested family to the core family that serves it.
///
/// Family names are case-insensitive; `arial` is an alias for `helvetica`.
pub fn resolve_family(family: &str) -> String {
    let lower = family.to_lowercase();
    if lower == "arial" {
        "helvetica".to_string()
    } else {
        lower
    }
}

/// Returns true if `family` (already resolved) is a core family.
pub fn is_core_family(family: &str) -> bool {
    CORE_FAMILIES.contains(&family)
}

/// Returns true for the symbolic core families, which have no bold or
/// italic variants.
pub fn is_symbolic_family(family: &str) -> bool {
    family == "symbol" || family == "zapfdingbats"
}

/// Definition of the core font stored under `key` (`family` + `B`/`I`/`BI`).
pub fn core_definition(key: &str) -> Option<FontDefinition> {
    let font = CORE_FONTS.get(key)?;
    Some(FontDefinition {
        kind: FontKind::Core,
        name: font.name.to_string(),
        desc: FontDescriptor {
            ascent: font.ascent,
            descent: font.descent,
            cap_height: font.cap_height,
            flags: font.flags,
            font_bbox: FontBox {
                xmin: font.bbox[0],
                ymin: font.bbox[1],
                xmax: font.bbox[2],
                ymax: font.bbox[3],
            },
            italic_angle: font.italic_angle,
            stem_v: font.stem_v,
            missing_width: 0,
        },
        underline_position: -100,
        underline_thickness: 50,
        widths: font.widths.to_vec(),
        encoding: "cp1252".to_string(),
        diff: String::new(),
        file: String::new(),
        size1: 0,
        size2: 0,
        original_size: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_core_keys_resolve() {
        for family in CORE_FAMILIES {
            let styles: &[&str] = if is_symbolic_family(family) { &[""] } else { &["", "B", "I", "BI"] };
            for style in styles {
                let key = format!("{}{}", family, style);
                let def = core_definition(&key).unwrap_or_else(|| panic!("missing {}", key));
                assert_eq!(def.widths.len(), 256);
                assert!(def.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_helvetica_widths() {
        let def = core_definition("helvetica").unwrap();
        assert_eq!(def.name, "Helvetica");
        assert_eq!(def.code_width(b' '), 278);
        assert_eq!(def.code_width(b'H'), 722);
        assert_eq!(def.code_width(b'e'), 556);
        assert_eq!(def.code_width(b'W'), 944);
        assert_eq!(def.code_width(0x80), 556);
        assert_eq!(def.desc.descent, -207);
    }

    #[test]
    fn test_bold_and_oblique_share_tables() {
        assert_eq!(core_definition("helveticaB").unwrap().code_width(b'a'), 556);
        assert_eq!(core_definition("helveticaB").unwrap().code_width(b'b'), 611);
        assert_eq!(
            core_definition("helveticaI").unwrap().widths,
            core_definition("helvetica").unwrap().widths
        );
        assert_eq!(core_definition("helveticaI").unwrap().name, "Helvetica-Oblique");
    }

    #[test]
    fn test_times_and_courier() {
        assert_eq!(core_definition("times").unwrap().code_width(b'A'), 722);
        assert_eq!(core_definition("timesBI").unwrap().name, "Times-BoldItalic");
        let courier = core_definition("courierB").unwrap();
        assert!(courier.widths.iter().all(|w| *w == 600));
        assert_ne!(courier.desc.flags & FLAG_FIXED_PITCH, 0);
    }

    #[test]
    fn test_aliasing() {
        assert_eq!(resolve_family("Arial"), "helvetica");
        assert_eq!(resolve_family("TIMES"), "times");
        assert!(is_core_family(&resolve_family("arial")));
        assert!(!is_core_family("dejavu"));
        assert!(is_symbolic_family("zapfdingbats"));
        assert!(core_definition("symbolB").is_none());
    }
}
