//! Numeric tags used by compiled MediaScript.

use std::fmt;

use serde::Serialize;

macro_rules! script_enum {
    ($(#[$meta:meta])* $name:ident : $repr:ty { $($variant:ident = $value:literal => $label:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn raw(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

script_enum! {
    /// Leading tag of every statement.
    InstructionType: u16 {
        Empty = 0x0000 => "empty",
        VariableRef = 0x0065 => "variable_ref",
        Operand = 0x0066 => "operand",
        FunctionCall = 0x0067 => "function_call",
    }
}

script_enum! {
    Opcode: u16 {
        If = 0xC9 => "if",
        IfElse = 0xCA => "if_else",
        AssignVariable = 0xCB => "assign",
        Or = 0xCC => "or",
        Xor = 0xCD => "xor",
        And = 0xCE => "and",
        Equals = 0xCF => "==",
        NotEquals = 0xD0 => "!=",
        LessThan = 0xD1 => "<",
        GreaterThan = 0xD2 => ">",
        LessThanOrEqualTo = 0xD3 => "<=",
        GreaterThanOrEqualTo = 0xD4 => ">=",
        Add = 0xD5 => "+",
        Subtract = 0xD6 => "-",
        Multiply = 0xD7 => "*",
        Divide = 0xD8 => "/",
        Modulo = 0xD9 => "%",
        Negate = 0xDA => "negate",
        CallFunction = 0xDB => "call_function",
        CallMethod = 0xDC => "call_method",
        DeclareLocals = 0xDD => "declare_locals",
        Return = 0xDE => "return",
        ReturnNoValue = 0xDF => "return_no_value",
        While = 0xE0 => "while",
        CallFunctionInVariable = 0xE1 => "call_function_in_variable",
        CallMethodInVariable = 0xE2 => "call_method_in_variable",
        Not = 0xE3 => "not",
    }
}

script_enum! {
    /// Literal payload kinds that can follow an operand instruction.
    OperandType: u16 {
        Empty = 0x00 => "empty",
        Bool = 0x97 => "bool",
        Float = 0x98 => "float",
        Int = 0x99 => "int",
        String = 0x9A => "string",
        ParamToken = 0x9B => "param_token",
        AssetId = 0x9C => "asset_id",
        Time = 0x9D => "time",
        Variable = 0x9E => "variable",
        FunctionId = 0x9F => "function_id",
        MethodId = 0xA0 => "method_id",
        Collection = 0xA1 => "collection",
    }
}

script_enum! {
    VariableScope: u16 {
        Local = 1 => "local",
        Parameter = 2 => "parameter",
        Global = 4 => "global",
    }
}

script_enum! {
    EventType: u16 {
        Timer = 5 => "timer",
        MouseDown = 6 => "mouse_down",
        MouseUp = 7 => "mouse_up",
        MouseMoved = 8 => "mouse_moved",
        MouseEntered = 9 => "mouse_entered",
        MouseExited = 10 => "mouse_exited",
        KeyDown = 13 => "key_down",
        SoundEnd = 14 => "sound_end",
        MovieEnd = 15 => "movie_end",
        PathEnd = 16 => "path_end",
        ScreenEntry = 17 => "screen_entry",
        SpriteMovieEnd = 23 => "sprite_movie_end",
        ScreenExit = 27 => "screen_exit",
        PathStep = 28 => "path_step",
        SoundStopped = 29 => "sound_stopped",
        SoundBegin = 30 => "sound_begin",
        MovieStopped = 31 => "movie_stopped",
        MovieBegin = 32 => "movie_begin",
        PathStopped = 33 => "path_stopped",
        CameraPanStep = 43 => "camera_pan_step",
        CameraPanEnd = 44 => "camera_pan_end",
        CameraPanAbort = 45 => "camera_pan_abort",
    }
}

script_enum! {
    /// Functions the engine answers without title code.
    BuiltInFunction: u32 {
        Random = 10 => "random",
        TimeOfDay = 11 => "time_of_day",
        EffectTransition = 12 => "effect_transition",
        EffectTransitionOnSync = 13 => "effect_transition_on_sync",
        SquareRoot = 15 => "square_root",
        GetUniqueRandom = 16 => "get_unique_random",
        CurrentRunTime = 17 => "current_run_time",
        DebugPrint = 180 => "debug_print",
    }
}

impl BuiltInFunction {
    /// Intrinsics are resolved before title functions and cannot be shadowed.
    pub fn is_intrinsic(self) -> bool {
        matches!(self, Self::EffectTransition | Self::EffectTransitionOnSync)
    }
}

script_enum! {
    BuiltInMethod: u32 {
        BranchToScreen = 201 => "branch_to_screen",
        SpatialShow = 202 => "spatial_show",
        SpatialHide = 203 => "spatial_hide",
        SpatialMoveTo = 204 => "spatial_move_to",
        SpatialMoveToByOffset = 205 => "spatial_move_to_by_offset",
        TimePlay = 206 => "time_play",
        TimeStop = 207 => "time_stop",
        MouseActivate = 210 => "mouse_activate",
        MouseDeactivate = 211 => "mouse_deactivate",
        SpatialZMoveTo = 216 => "spatial_z_move_to",
        MovieReset = 219 => "movie_reset",
        SetCurrentClip = 220 => "set_current_clip",
        IncrementFrame = 224 => "increment_frame",
        DecrementFrame = 225 => "decrement_frame",
        SpatialCenterMoveTo = 230 => "spatial_center_move_to",
        GetLeftX = 233 => "get_left_x",
        GetTopY = 234 => "get_top_y",
        GetWidth = 235 => "get_width",
        GetHeight = 236 => "get_height",
        GetCurrentClipId = 240 => "get_current_clip_id",
        SetDissolveFactor = 241 => "set_dissolve_factor",
        Append = 247 => "append",
        Apply = 248 => "apply",
        Count = 249 => "count",
        DeleteFirst = 250 => "delete_first",
        DeleteLast = 251 => "delete_last",
        Empty = 252 => "empty",
        GetAt = 253 => "get_at",
        IsEmpty = 254 => "is_empty",
        Jumble = 255 => "jumble",
        Seek = 256 => "seek",
        Send = 257 => "send",
        DeleteAt = 258 => "delete_at",
        InsertAt = 259 => "insert_at",
        ReplaceAt = 260 => "replace_at",
        PrependList = 261 => "prepend_list",
        SetDuration = 262 => "set_duration",
        PercentComplete = 263 => "percent_complete",
        GetPathX = 264 => "get_path_x",
        GetPathY = 265 => "get_path_y",
        Sort = 266 => "sort",
        IsVisible = 269 => "is_visible",
        ReleaseContext = 323 => "release_context",
        ViewportMoveTo = 350 => "viewport_move_to",
        PanTo = 351 => "pan_to",
        PanToBySteps = 352 => "pan_to_by_steps",
        StopPan = 353 => "stop_pan",
        IsPanning = 354 => "is_panning",
        GetViewportLeftX = 355 => "get_viewport_left_x",
        GetViewportTopY = 356 => "get_viewport_top_y",
        AddActorToStage = 360 => "add_actor_to_stage",
        RemoveActorFromStage = 361 => "remove_actor_from_stage",
        IsPlaying = 372 => "is_playing",
    }
}

/// Asset id the bytecode uses to address engine-level methods.
pub const DOCUMENT_ACTOR_ID: u32 = 1;
